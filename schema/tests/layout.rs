use proptest::prelude::*;
use schema::{FieldId, GroupId, FIELD_COUNT};

#[test]
fn group_field_lists_ascend() {
    for group in GroupId::ALL {
        let fields = group.fields();
        for pair in fields.windows(2) {
            assert!(pair[0].index() < pair[1].index());
        }
    }
}

proptest! {
    #[test]
    fn from_index_matches_table(index in any::<u8>()) {
        match FieldId::from_index(index) {
            Some(field) => {
                prop_assert!(usize::from(index) < FIELD_COUNT);
                prop_assert_eq!(field.index(), index);
            }
            None => prop_assert!(usize::from(index) >= FIELD_COUNT),
        }
    }

    #[test]
    fn unknown_group_ids_rejected(id in 12u8..) {
        prop_assert!(GroupId::from_id(id).is_none());
    }
}
