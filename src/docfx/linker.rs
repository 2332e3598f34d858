//! Attaches children to their owning module and class records.
//!
//! Both passes scan the owner's collection linearly and link to the first
//! matching record. Same-named records in one collection therefore always
//! resolve to whichever was documented first.

use log::debug;

use super::model::{Item, ObjectType};
use super::session::BuildSession;
use crate::error::BuildWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// The parent already lists this child
    Duplicate,
    NoParent,
    /// This pass does not link items of this type
    NotApplicable,
}

/// Attach functions, classes and exceptions to their module record.
///
/// Functions also join the module's item list, since they are rendered in
/// the module file. Classes and exceptions get a file of their own.
pub fn insert_children_on_module(session: &mut BuildSession, item: &Item) -> LinkOutcome {
    if !matches!(
        item.object_type,
        ObjectType::Function | ObjectType::Class | ObjectType::Exception
    ) {
        return LinkOutcome::NotApplicable;
    }

    let outcome = match session.modules.get_mut(&item.module) {
        Some(records) => link_into(records, item, ObjectType::Function, |record| {
            record.object_type == ObjectType::Module && record.module == item.module
        }),
        None => LinkOutcome::NoParent,
    };

    match outcome {
        LinkOutcome::NoParent => {
            session.push_warning(BuildWarning::missing_parent(&item.uid, &item.module));
        }
        LinkOutcome::Duplicate => {
            debug!("{} is already a child of module {}", item.uid, item.module);
        }
        _ => {}
    }
    outcome
}

/// Attach methods and attributes to their class record.
///
/// A member whose class was never documented is skipped quietly.
pub fn insert_children_on_class(session: &mut BuildSession, item: &Item) -> LinkOutcome {
    if !matches!(item.object_type, ObjectType::Method | ObjectType::Attribute) {
        return LinkOutcome::NotApplicable;
    }
    let Some(class) = item.class.as_deref() else {
        return LinkOutcome::NotApplicable;
    };

    let outcome = match session.classes.get_mut(class) {
        Some(records) => link_into(records, item, item.object_type, |record| {
            record.object_type.is_class_like() && record.class.as_deref() == Some(class)
        }),
        None => LinkOutcome::NoParent,
    };

    if outcome == LinkOutcome::NoParent {
        debug!("No class record for {}, skipping {}", class, item.uid);
    }
    outcome
}

/// Link `item` under the first record matching `is_parent`, and append the
/// item to `records` when its type is `listed_type`.
fn link_into<F>(
    records: &mut Vec<Item>,
    item: &Item,
    listed_type: ObjectType,
    is_parent: F,
) -> LinkOutcome
where
    F: Fn(&Item) -> bool,
{
    let Some(parent) = records.iter_mut().find(|record| is_parent(record)) else {
        return LinkOutcome::NoParent;
    };

    if !parent.add_child(item) {
        return LinkOutcome::Duplicate;
    }

    if item.object_type == listed_type {
        records.push(item.clone());
    }
    LinkOutcome::Linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docfx::record::{create_item, get_cls_module};
    use crate::docfx::session::DocfxSettings;
    use crate::error::WarningKind;
    use crate::introspect::ObjectInfo;
    use crate::repo::RepoInfo;

    fn session() -> BuildSession {
        BuildSession::new(DocfxSettings::new("_build", "api"), RepoInfo::default())
    }

    fn located(what: &str) -> ObjectInfo {
        ObjectInfo::new(what)
            .with_signature(&[], &[])
            .with_source("/src/pkg/mod.py", 1)
    }

    fn feed(session: &mut BuildSession, what: &str, name: &str) {
        session.process_docstring(what, name, &located(what), &[]);
    }

    fn build_item(session: &mut BuildSession, what: &str, name: &str) -> Item {
        let object_type: ObjectType = what.parse().unwrap();
        let owner = get_cls_module(object_type, name).unwrap();
        create_item(
            &RepoInfo::default(),
            object_type,
            name,
            &owner,
            &located(what),
            &[],
            &mut session.warnings,
        )
    }

    #[test]
    fn test_link_outcomes() {
        let mut session = session();
        feed(&mut session, "module", "pkg.mod");
        feed(&mut session, "class", "pkg.mod.Foo");

        let bar = build_item(&mut session, "method", "pkg.mod.Foo.bar");
        assert_eq!(insert_children_on_class(&mut session, &bar), LinkOutcome::Linked);
        assert_eq!(insert_children_on_class(&mut session, &bar), LinkOutcome::Duplicate);
        assert_eq!(
            insert_children_on_module(&mut session, &bar),
            LinkOutcome::NotApplicable
        );

        let orphan = build_item(&mut session, "method", "pkg.mod.Gone.bar");
        assert_eq!(insert_children_on_class(&mut session, &orphan), LinkOutcome::NoParent);

        let func = build_item(&mut session, "function", "pkg.other.func");
        assert_eq!(insert_children_on_module(&mut session, &func), LinkOutcome::NoParent);
        assert_eq!(session.warnings.len(), 1);
        assert_eq!(session.warnings[0].kind, WarningKind::MissingParent);
    }

    #[test]
    fn test_function_listed_in_module() {
        let mut session = session();
        feed(&mut session, "module", "pkg.mod");
        feed(&mut session, "function", "pkg.mod.func");

        let records = &session.modules["pkg.mod"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].children, Some(vec!["pkg.mod.func".to_string()]));
        let references = records[0].references.as_ref().unwrap();
        assert_eq!(references[0].parent, "pkg.mod");
        assert_eq!(references[0].uid, "pkg.mod.func");
    }

    #[test]
    fn test_class_not_listed_in_module() {
        let mut session = session();
        feed(&mut session, "module", "pkg.mod");
        feed(&mut session, "class", "pkg.mod.Foo");

        let records = &session.modules["pkg.mod"];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].children, Some(vec!["pkg.mod.Foo".to_string()]));
        assert_eq!(session.classes["pkg.mod.Foo"].len(), 1);
    }

    #[test]
    fn test_missing_module_warns() {
        let mut session = session();
        feed(&mut session, "function", "pkg.mod.func");
        assert_eq!(session.warnings.len(), 1);
        assert!(session.modules.get("pkg.mod").is_none());
    }

    #[test]
    fn test_member_without_class_is_skipped_quietly() {
        let mut session = session();
        feed(&mut session, "method", "pkg.mod.Foo.bar");
        assert!(session.warnings.is_empty());
        assert!(session.classes.is_empty());
    }

    #[test]
    fn test_member_linked_once() {
        let mut session = session();
        feed(&mut session, "class", "pkg.mod.Foo");
        feed(&mut session, "method", "pkg.mod.Foo.bar");
        feed(&mut session, "method", "pkg.mod.Foo.bar");

        let records = &session.classes["pkg.mod.Foo"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].children, Some(vec!["pkg.mod.Foo.bar".to_string()]));
        assert_eq!(records[0].references.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_exception_members_link() {
        let mut session = session();
        feed(&mut session, "module", "pkg.errors");
        feed(&mut session, "exception", "pkg.errors.BadThing");
        feed(&mut session, "attribute", "pkg.errors.BadThing.code");

        let records = &session.classes["pkg.errors.BadThing"];
        assert_eq!(
            records[0].children,
            Some(vec!["pkg.errors.BadThing.code".to_string()])
        );
        assert_eq!(
            session.modules["pkg.errors"][0].children,
            Some(vec!["pkg.errors.BadThing".to_string()])
        );
    }
}
