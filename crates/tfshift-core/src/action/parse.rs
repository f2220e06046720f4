//! Parsing action strings such as `mv aws_instance.a aws_instance.b`.

use super::import::ImportAction;
use super::mv::MoveAction;
use super::rm::RemoveAction;
use super::xmv::ExpansionAction;
use super::{ActionError, StateAction};

/// Split an action string into words.
///
/// Whitespace separates words. Single quotes group literally and are
/// removed. Double quotes also group but are kept, since they are part of
/// string keys such as `aws_instance.foo["a b"]`.
pub fn tokenize(action: &str) -> Result<Vec<String>, ActionError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = action.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(parse_error(action, "unterminated single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                current.push('"');
                loop {
                    match chars.next() {
                        Some('"') => {
                            current.push('"');
                            break;
                        }
                        Some('\\') => {
                            current.push('\\');
                            match chars.next() {
                                Some(c) => current.push(c),
                                None => return Err(parse_error(action, "unterminated double quote")),
                            }
                        }
                        Some(c) => current.push(c),
                        None => return Err(parse_error(action, "unterminated double quote")),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse an action string into a state action.
///
/// Supported forms:
///
/// | Action | Form |
/// |--------|------|
/// | move | `mv <source> <destination>` |
/// | wildcard move | `xmv <source-pattern> <destination-template>` |
/// | remove | `rm <address>...` |
/// | import | `import <address> <id>` |
pub fn parse_action(action: &str) -> Result<Box<dyn StateAction>, ActionError> {
    let words = tokenize(action)?;
    let (verb, args) = match words.split_first() {
        Some((verb, args)) => (verb.as_str(), args),
        None => return Err(parse_error(action, "empty action")),
    };

    match verb {
        "mv" => {
            let [source, destination] = exact::<2>(action, verb, args)?;
            Ok(Box::new(MoveAction::new(source, destination)))
        }
        "xmv" => {
            let [source, destination] = exact::<2>(action, verb, args)?;
            Ok(Box::new(ExpansionAction::new(source, destination)))
        }
        "rm" => {
            if args.is_empty() {
                return Err(parse_error(action, "rm requires at least one address"));
            }
            Ok(Box::new(RemoveAction::new(args.to_vec())))
        }
        "import" => {
            let [address, id] = exact::<2>(action, verb, args)?;
            Ok(Box::new(ImportAction::new(address, id)))
        }
        other => Err(parse_error(action, &format!("unknown action type `{}`", other))),
    }
}

fn exact<const N: usize>(action: &str, verb: &str, args: &[String]) -> Result<[String; N], ActionError> {
    <[String; N]>::try_from(args.to_vec()).map_err(|_| {
        parse_error(
            action,
            &format!("{} requires {} arguments, got {}", verb, N, args.len()),
        )
    })
}

fn parse_error(action: &str, reason: &str) -> ActionError {
    ActionError::Parse {
        action: action.to_string(),
        reason: reason.to_string(),
    }
}
