//! The sample data payload served to authenticated users.

use gatehouse_platform_access::UserIdentity;
use serde::{Deserialize, Serialize};

/// One illustrative item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleItem {
    pub id: u32,
    pub name: String,
}

/// Fixed sample data, annotated with who asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleData {
    pub items: Vec<SampleItem>,
    pub count: usize,
    pub user: String,
}

impl SampleData {
    /// Builds the three sample items, labelled with the user's email, name,
    /// or a generic placeholder.
    #[must_use]
    pub fn for_user(user: &UserIdentity) -> Self {
        let items: Vec<SampleItem> = (1..=3)
            .map(|id| SampleItem {
                id,
                name: format!("Sample Item {id}"),
            })
            .collect();
        Self {
            count: items.len(),
            items,
            user: user.display_label().to_string(),
        }
    }
}
