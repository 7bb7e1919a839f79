//! `bonnet attr` command
//!
//! # Usage
//! ```bash
//! bonnet attr --about car "color=red"
//! bonnet attr --about T1 --type rule "never park on the street"
//! bonnet attr --about car --type task "service=book an appointment" --due 2026-11-01
//! ```

use anyhow::Result;
use clap::Args;

use super::utils::{open_storage, pick};
use super::Globals;
use crate::core::record::{parse_due, AttributeType, RecordFields};

/// Edge type from a record to its attributes
pub const HAS_ATTRIBUTE: &str = "has_attribute";

#[derive(Args, Debug)]
pub struct AttrArgs {
    /// `subject=detail`, or just the detail
    pub text: String,

    /// Record the attribute belongs to (id or search text)
    #[arg(short, long)]
    pub about: Option<String>,

    /// Attribute type: fact, ref, task, rule
    #[arg(short = 't', long = "type", default_value = "fact")]
    pub attr_type: AttributeType,

    /// Explicit id (default: derived from the parent id)
    #[arg(long)]
    pub id: Option<String>,

    /// Due date for tasks (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Fail instead of choosing when --about matches several records
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: AttrArgs, globals: &Globals) -> Result<()> {
    let session = open_storage(globals)?;
    let storage = &session.storage;

    let (subject, detail) = split_payload(&args.text, args.attr_type);
    let due = args.due.as_deref().map(parse_due).transpose()?;
    let fields = RecordFields::Attribute {
        attr_type: args.attr_type,
        subject,
        detail,
        due,
    };

    let id = match &args.about {
        Some(reference) => {
            let parent = pick(storage, reference, args.strict, globals)?;
            storage.store_attached(args.id.as_deref(), fields, &parent.node, HAS_ATTRIBUTE)?
        }
        None => storage.store(args.id.as_deref(), fields)?,
    };

    println!("{}", id);
    Ok(())
}

/// Split `subject=detail`. Without `=`, the subject is the lower-cased type
/// name and the whole text is the detail.
pub fn split_payload(text: &str, attr_type: AttributeType) -> (String, String) {
    match text.split_once('=') {
        Some((subject, detail)) => (subject.trim().to_string(), detail.trim().to_string()),
        None => (attr_type.as_str().to_lowercase(), text.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_subject_detail() {
        assert_eq!(
            split_payload("color = red", AttributeType::Fact),
            ("color".to_string(), "red".to_string())
        );
    }

    #[test]
    fn test_split_keeps_later_equals() {
        assert_eq!(
            split_payload("formula=a=b+c", AttributeType::Fact),
            ("formula".to_string(), "a=b+c".to_string())
        );
    }

    #[test]
    fn test_split_without_subject() {
        assert_eq!(
            split_payload("never park on the street", AttributeType::Rule),
            ("rule".to_string(), "never park on the street".to_string())
        );
    }
}
