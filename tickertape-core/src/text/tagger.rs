//! Heuristic Penn Treebank tagger.
//!
//! Closed-class words come from a small lexicon; open-class words are
//! guessed from shape and suffix. The property the pipeline depends on is
//! that all-caps tokens (tickers) and mid-sentence capitalized words are
//! tagged `NNP`.

fn closed_class(lower: &str) -> Option<&'static str> {
    let tag = match lower {
        "the" | "a" | "an" | "this" | "that" | "these" | "those" | "each" | "every" | "some"
        | "any" | "no" | "all" | "both" | "another" => "DT",
        "in" | "on" | "at" | "of" | "for" | "with" | "by" | "from" | "into" | "over" | "under"
        | "after" | "before" | "during" | "about" | "against" | "between" | "through"
        | "since" | "amid" | "despite" | "per" | "than" | "as" | "while" | "because" | "if"
        | "though" | "although" | "whether" | "until" | "below" | "above" | "across" => "IN",
        "to" => "TO",
        "and" | "or" | "but" | "nor" | "yet" => "CC",
        "i" | "he" | "she" | "it" | "we" | "they" | "you" | "me" | "him" | "us" | "them" => "PRP",
        "its" | "his" | "her" | "their" | "our" | "my" | "your" => "PRP$",
        "will" | "would" | "can" | "could" | "may" | "might" | "shall" | "should" | "must" => {
            "MD"
        }
        "is" | "has" | "does" => "VBZ",
        "are" | "have" | "do" | "am" => "VBP",
        "was" | "were" | "had" | "did" => "VBD",
        "be" => "VB",
        "been" => "VBN",
        "being" => "VBG",
        "which" => "WDT",
        "who" | "what" => "WP",
        "when" | "where" | "how" | "why" => "WRB",
        "not" | "also" | "very" | "just" | "still" => "RB",
        "there" => "EX",
        _ => return None,
    };
    Some(tag)
}

fn punctuation_tag(tok: &str) -> &'static str {
    match tok {
        "." | "!" | "?" => ".",
        "," => ",",
        ":" | ";" | "-" | "--" | "—" | "–" => ":",
        "(" | "[" | "{" => "(",
        ")" | "]" | "}" => ")",
        "$" => "$",
        "#" => "#",
        "\"" | "“" | "`" => "``",
        "”" | "'" => "''",
        _ => "SYM",
    }
}

fn is_all_caps(tok: &str) -> bool {
    let mut letters = tok.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn open_class_by_suffix(lower: &str) -> &'static str {
    if lower.ends_with("ly") {
        "RB"
    } else if lower.ends_with("ing") {
        "VBG"
    } else if lower.ends_with("ed") {
        "VBD"
    } else if lower.ends_with("est") {
        "JJS"
    } else if ["ous", "ful", "ive", "able", "ible", "al", "ic"]
        .iter()
        .any(|s| lower.ends_with(s))
    {
        "JJ"
    } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
        "NNS"
    } else {
        "NN"
    }
}

fn tag_one(tok: &str, sentence_initial: bool) -> &'static str {
    if tok.eq_ignore_ascii_case("'s") || tok == "’s" {
        return "POS";
    }
    if !tok.chars().any(char::is_alphanumeric) {
        return punctuation_tag(tok);
    }
    let first = tok.chars().find(|c| c.is_alphanumeric());
    if first.is_some_and(|c| c.is_ascii_digit()) || tok.starts_with('$') {
        return "CD";
    }

    let lower = tok.to_lowercase();
    if is_all_caps(tok) && tok.chars().filter(|c| c.is_alphabetic()).count() > 1 {
        return "NNP";
    }
    if tok.chars().next().is_some_and(char::is_uppercase) {
        if sentence_initial {
            if let Some(tag) = closed_class(&lower) {
                return tag;
            }
            // Sentence-initial capitalized words are ambiguous; a plural-looking
            // common word ("Shares") is more likely a noun than a name.
            return match open_class_by_suffix(&lower) {
                "NNS" => "NNS",
                _ => "NNP",
            };
        }
        return "NNP";
    }

    closed_class(&lower).unwrap_or_else(|| open_class_by_suffix(&lower))
}

/// Tag every token of one sentence.
pub fn tag_tokens(tokens: &[String]) -> Vec<String> {
    let mut tags = Vec::with_capacity(tokens.len());
    let mut sentence_initial = true;
    for tok in tokens {
        let tag = tag_one(tok, sentence_initial);
        // Opening quotes and brackets keep the next word sentence-initial.
        sentence_initial = matches!(tag, "``" | "(");
        tags.push(tag.to_string());
    }
    tags
}
