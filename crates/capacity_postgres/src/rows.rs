//! Row types and row → domain conversion.

use std::collections::HashMap;

use capacity_core::model::{CapabilitiesBasicPerBootcamp, Capacity, CapacityBasicItem};

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CapacityRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<CapacityRow> for Capacity {
    fn from(row: CapacityRow) -> Self {
        Capacity {
            id: Some(row.id),
            name: row.name,
            description: row.description,
            technologies: Vec::new(),
        }
    }
}

/// One (bootcamp, capacity) pair from the join query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CapacityBootcampRow {
    pub bootcamp_id: i64,
    pub capacity_id: i64,
    pub capacity_name: String,
}

/// Group join rows per bootcamp, emitting groups in `bootcamp_order`.
/// Bootcamps without rows are left out; repeated ids in the order are emitted once.
pub(crate) fn group_by_bootcamp(
    rows: Vec<CapacityBootcampRow>,
    bootcamp_order: &[i64],
) -> Vec<CapabilitiesBasicPerBootcamp> {
    let mut groups: HashMap<i64, Vec<CapacityBasicItem>> = HashMap::new();
    for row in rows {
        groups
            .entry(row.bootcamp_id)
            .or_default()
            .push(CapacityBasicItem {
                id: row.capacity_id,
                name: row.capacity_name,
            });
    }

    bootcamp_order
        .iter()
        .filter_map(|id| {
            groups.remove(id).map(|capabilities| CapabilitiesBasicPerBootcamp {
                id: *id,
                capabilities,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bootcamp_id: i64, capacity_id: i64) -> CapacityBootcampRow {
        CapacityBootcampRow {
            bootcamp_id,
            capacity_id,
            capacity_name: format!("cap-{capacity_id}"),
        }
    }

    #[test]
    fn groups_follow_requested_order() {
        let rows = vec![row(1, 10), row(2, 20), row(1, 11)];
        let grouped = group_by_bootcamp(rows, &[2, 1]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, 2);
        assert_eq!(grouped[1].id, 1);
        let ids: Vec<_> = grouped[1].capabilities.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn bootcamps_without_rows_and_repeats_are_dropped() {
        let grouped = group_by_bootcamp(vec![row(1, 10)], &[3, 1, 1]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].id, 1);
    }

    #[test]
    fn capacity_row_has_no_technologies() {
        let capacity: Capacity = CapacityRow {
            id: 4,
            name: "Backend".into(),
            description: "Server side".into(),
        }
        .into();
        assert_eq!(capacity.id, Some(4));
        assert!(capacity.technologies.is_empty());
    }
}
