use serde::{Deserialize, Serialize};

use crate::deal::{Deal, DealId};
use crate::stage::Stage;

/// One rendered board column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnView {
    pub stage: Stage,
    pub locked: bool,
    pub deals: Vec<Deal>,
}

/// The five board columns in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Columns {
    pub columns: Vec<ColumnView>,
}

/// Bucket deals into the canonical columns.
///
/// Each deal lands in exactly one column, chosen by [`Deal::display_stage`].
/// Input order is preserved inside a column; nothing is re-sorted.
pub fn compute_columns(deals: &[Deal]) -> Columns {
    let mut columns: Vec<ColumnView> = Stage::ALL
        .iter()
        .map(|stage| ColumnView {
            stage: *stage,
            locked: stage.is_terminal(),
            deals: Vec::new(),
        })
        .collect();

    for deal in deals {
        columns[deal.display_stage().index()].deals.push(deal.clone());
    }

    Columns { columns }
}

impl Columns {
    pub fn column(&self, stage: Stage) -> &ColumnView {
        &self.columns[stage.index()]
    }

    /// The column that currently holds the deal.
    pub fn stage_of(&self, id: &DealId) -> Option<Stage> {
        self.columns
            .iter()
            .find(|col| col.deals.iter().any(|d| &d.id == id))
            .map(|col| col.stage)
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.deals.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::DealStatus;

    fn ids(col: &ColumnView) -> Vec<&str> {
        col.deals.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_empty_board_has_five_ordered_columns() {
        let cols = compute_columns(&[]);
        let stages: Vec<Stage> = cols.columns.iter().map(|c| c.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert!(cols.is_empty());
    }

    #[test]
    fn test_every_deal_in_exactly_one_column() {
        let deals = vec![
            Deal::new("a", Stage::Lead),
            Deal::new("b", Stage::Won),
            Deal::new("c", Stage::Contacted),
            Deal::new("d", Stage::Lead),
        ];
        let cols = compute_columns(&deals);
        assert_eq!(cols.len(), deals.len());
        for deal in &deals {
            let hits = cols
                .columns
                .iter()
                .filter(|c| c.deals.iter().any(|d| d.id == deal.id))
                .count();
            assert_eq!(hits, 1, "deal {} appears {} times", deal.id, hits);
        }
    }

    #[test]
    fn test_insertion_order_preserved_within_column() {
        let deals = vec![
            Deal::new("z", Stage::Lead),
            Deal::new("a", Stage::Lead),
            Deal::new("m", Stage::Lead),
        ];
        let cols = compute_columns(&deals);
        assert_eq!(ids(cols.column(Stage::Lead)), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_terminal_status_overrides_stage_label() {
        let mut deal = Deal::new("x", Stage::Proposal);
        deal.status = DealStatus::Won;
        let cols = compute_columns(&[deal]);
        assert_eq!(ids(cols.column(Stage::Won)), vec!["x"]);
        assert!(cols.column(Stage::Proposal).deals.is_empty());
    }

    #[test]
    fn test_terminal_columns_are_locked() {
        let cols = compute_columns(&[]);
        assert!(cols.column(Stage::Won).locked);
        assert!(cols.column(Stage::Lost).locked);
        assert!(!cols.column(Stage::Proposal).locked);
    }

    #[test]
    fn test_stage_of() {
        let cols = compute_columns(&[Deal::new("a", Stage::Contacted)]);
        assert_eq!(cols.stage_of(&DealId::new("a")), Some(Stage::Contacted));
        assert_eq!(cols.stage_of(&DealId::new("missing")), None);
    }
}
