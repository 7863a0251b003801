//! Query string syntax used by the command line
//!
//! ```text
//! query   := group (group)*            all groups must match (AND)
//! group   := term ("OR" term)*         any term may match
//! term    := "-" atom                  excluded
//!          | "+" atom                  explicitly included
//!          | atom
//! atom    := '"' phrase '"'            exact phrase
//!          | key ":" value             class tag (e.g. filetype:java)
//!          | word
//! ```

use super::ast::QueryNode;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Phrase(String),
    Or,
}

/// Parse a query string into a [`QueryNode`]
///
/// Never fails: stray quotes end the phrase at end of input and a dangling
/// `OR` is ignored. An empty query parses to [`QueryNode::Empty`].
pub fn parse_query(input: &str) -> QueryNode {
    let tokens = tokenize(input);

    let mut groups: Vec<Vec<QueryNode>> = Vec::new();
    let mut join_previous = false;
    for token in tokens {
        let node = match token {
            Token::Or => {
                join_previous = !groups.is_empty();
                continue;
            }
            Token::Phrase(phrase) => QueryNode::ExactMatchingText(phrase),
            Token::Word(word) => parse_term(&word),
        };

        match groups.last_mut() {
            Some(group) if join_previous => group.push(node),
            _ => groups.push(vec![node]),
        }
        join_previous = false;
    }

    let mut nodes: Vec<QueryNode> = groups
        .into_iter()
        .map(|mut group| {
            if group.len() == 1 {
                group.remove(0)
            } else {
                QueryNode::Or(group)
            }
        })
        .collect();

    match nodes.len() {
        0 => QueryNode::Empty,
        1 => nodes.remove(0),
        _ => QueryNode::And(nodes),
    }
}

fn parse_term(word: &str) -> QueryNode {
    if let Some(rest) = word.strip_prefix('-').filter(|r| !r.is_empty()) {
        return QueryNode::excluding(parse_atom(rest));
    }
    if let Some(rest) = word.strip_prefix('+').filter(|r| !r.is_empty()) {
        return QueryNode::including(parse_atom(rest));
    }
    parse_atom(word)
}

fn parse_atom(word: &str) -> QueryNode {
    if let Some(phrase) = word.strip_prefix('"') {
        return QueryNode::ExactMatchingText(phrase.trim_end_matches('"').to_string());
    }
    match word.split_once(':') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => QueryNode::metadata(key, value),
        _ => QueryNode::text(word),
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let phrase: String = chars.by_ref().take_while(|&c| c != '"').collect();
            if !phrase.trim().is_empty() {
                tokens.push(Token::Phrase(phrase.trim().to_string()));
            }
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            chars.next();
            // A prefixed phrase: -"..." or +"..."
            if (word == "-\"" || word == "+\"") && c == '"' {
                let phrase: String = chars.by_ref().take_while(|&c| c != '"').collect();
                word.push_str(&phrase);
                break;
            }
        }

        if word == "OR" {
            tokens.push(Token::Or);
        } else {
            tokens.push(Token::Word(word));
        }
    }

    tokens
}
