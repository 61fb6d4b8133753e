//! Verb-only lemmatizer.
//!
//! Only lowercase alphabetic words are touched, so tickers, names and
//! numbers pass through verbatim.

fn irregular(word: &str) -> Option<&'static str> {
    let lemma = match word {
        "is" | "are" | "am" | "was" | "were" | "been" | "being" => "be",
        "has" | "had" | "having" => "have",
        "does" | "did" | "done" | "doing" => "do",
        "rose" | "risen" => "rise",
        "fell" | "fallen" => "fall",
        "went" | "gone" | "goes" => "go",
        "made" => "make",
        "said" => "say",
        "saw" | "seen" => "see",
        "took" | "taken" => "take",
        "gave" | "given" => "give",
        "got" | "gotten" => "get",
        "grew" | "grown" => "grow",
        "sold" => "sell",
        "bought" => "buy",
        "led" => "lead",
        "began" | "begun" => "begin",
        "came" => "come",
        "became" => "become",
        "held" => "hold",
        "kept" => "keep",
        "left" => "leave",
        "lost" => "lose",
        "met" => "meet",
        "paid" => "pay",
        "ran" => "run",
        "sent" => "send",
        "spent" => "spend",
        "stood" => "stand",
        "thought" => "think",
        "told" => "tell",
        "won" => "win",
        "wrote" | "written" => "write",
        "brought" => "bring",
        "built" => "build",
        "found" => "find",
        "sank" | "sunk" => "sink",
        "slid" => "slide",
        "shook" | "shaken" => "shake",
        _ => return None,
    };
    Some(lemma)
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// `stopp` -> `stop`, `runn` -> `run`; `sell`, `miss` and `buzz` keep their double.
fn undouble(stem: &str) -> &str {
    let b = stem.as_bytes();
    let n = b.len();
    if n >= 3 && b[n - 1] == b[n - 2] && !is_vowel(b[n - 1]) && !matches!(b[n - 1], b'l' | b's' | b'z')
    {
        &stem[..n - 1]
    } else {
        stem
    }
}

/// Restore a silent `e` dropped by `-ed`/`-ing` (`increas` -> `increase`).
fn restore_e(stem: &str) -> String {
    let needs_e = ["c", "v", "z", "g", "u", "as", "is", "os", "us", "at", "ir", "ur"]
        .iter()
        .any(|s| stem.ends_with(s))
        || (stem.ends_with("in") && !stem.ends_with("ain") && !stem.ends_with("ein"));
    if needs_e && !stem.ends_with("ss") {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

/// Lemmatize `word` as a verb. Unknown shapes are returned unchanged.
pub fn lemmatize_verb(word: &str) -> String {
    if word.len() < 3 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }
    if let Some(lemma) = irregular(word) {
        return lemma.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ied") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if word.ends_with("eed") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.len() >= 3 {
            let undoubled = undouble(stem);
            return if undoubled.len() < stem.len() {
                undoubled.to_string()
            } else {
                restore_e(stem)
            };
        }
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.len() >= 3 {
            let undoubled = undouble(stem);
            return if undoubled.len() < stem.len() {
                undoubled.to_string()
            } else {
                restore_e(stem)
            };
        }
        return word.to_string();
    }
    for sibilant in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(sibilant) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}
