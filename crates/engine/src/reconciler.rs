use core_types::{Owner, RawRow};

/// Merges one owner's edited rows back into the shared multi-owner store.
///
/// The edited rows are a full replacement for everything `owner` had before, not
/// a patch: rows missing from `edited` are gone, new rows are appended. Rows of
/// other owners come through untouched and in their original order, followed by
/// the edited rows, each stamped with `owner`.
///
/// Pure: reading and writing the store is the caller's job.
pub fn reconcile(store: &[RawRow], owner: &Owner, edited: Vec<RawRow>) -> Vec<RawRow> {
    let mut merged: Vec<RawRow> = store
        .iter()
        .filter(|row| !owner.matches(&row.owner))
        .cloned()
        .collect();

    merged.extend(edited.into_iter().map(|row| RawRow {
        owner: owner.to_string(),
        ..row
    }));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Owner {
        Owner::new("alice").unwrap()
    }

    fn store() -> Vec<RawRow> {
        vec![
            RawRow::new("alice", "2023-01-01", "-100"),
            RawRow::new("bob", "2023-01-01", "-900"),
            RawRow::new("alice", "2023-02-01", "-100"),
            RawRow::new("bob", "2023-03-01", "1000"),
            RawRow::new("alice", "2023-03-01", "-100"),
        ]
    }

    fn owned_by<'a>(rows: &'a [RawRow], owner: &'a str) -> Vec<&'a RawRow> {
        rows.iter().filter(|r| r.owner == owner).collect()
    }

    #[test]
    fn other_owners_are_untouched() {
        let before = store();
        let after = reconcile(&before, &alice(), vec![RawRow::new("", "2024-01-01", "50")]);
        assert_eq!(owned_by(&after, "bob"), owned_by(&before, "bob"));
    }

    #[test]
    fn edited_rows_replace_rather_than_union() {
        let after = reconcile(
            &store(),
            &alice(),
            vec![RawRow::new("alice", "2023-01-01", "-300")],
        );
        assert_eq!(owned_by(&after, "alice").len(), 1);
        assert_eq!(after.len(), 3);
    }

    #[test]
    fn edited_rows_are_stamped_with_the_owner() {
        let after = reconcile(&store(), &alice(), vec![RawRow::new("mallory", "2023-01-01", "1")]);
        assert!(owned_by(&after, "mallory").is_empty());
        assert_eq!(after.last().unwrap(), &RawRow::new("alice", "2023-01-01", "1"));
    }

    #[test]
    fn empty_edit_removes_the_owner() {
        let after = reconcile(&store(), &alice(), Vec::new());
        assert!(owned_by(&after, "alice").is_empty());
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn unknown_owner_is_appended() {
        let carol = Owner::new("carol").unwrap();
        let after = reconcile(&store(), &carol, vec![RawRow::new("", "2023-01-01", "-1")]);
        assert_eq!(&after[..5], &store()[..]);
        assert_eq!(after[5].owner, "carol");
    }
}
