//! Bidirectional mapping between external ids and matrix positions

use crate::error::{IdKind, RecommenderError, Result};
use crate::matrix::UserItemMatrix;
use std::collections::HashMap;

/// Id index built from a matrix's row and column labels
///
/// Immutable once built; both directions cover exactly the label sets.
#[derive(Debug, Clone)]
pub struct IdIndex {
    id_to_userid: Vec<u64>,
    id_to_itemid: Vec<u64>,
    userid_to_id: HashMap<u64, usize>,
    itemid_to_id: HashMap<u64, usize>,
}

impl IdIndex {
    pub fn from_matrix(matrix: &UserItemMatrix) -> Self {
        Self::from_labels(matrix.user_ids().to_vec(), matrix.item_ids().to_vec())
    }

    fn from_labels(user_ids: Vec<u64>, item_ids: Vec<u64>) -> Self {
        let userid_to_id = user_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let itemid_to_id = item_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self {
            id_to_userid: user_ids,
            id_to_itemid: item_ids,
            userid_to_id,
            itemid_to_id,
        }
    }

    pub fn internal_user(&self, user_id: u64) -> Result<usize> {
        self.userid_to_id
            .get(&user_id)
            .copied()
            .ok_or_else(|| RecommenderError::key_not_found(IdKind::User, user_id))
    }

    pub fn internal_item(&self, item_id: u64) -> Result<usize> {
        self.itemid_to_id
            .get(&item_id)
            .copied()
            .ok_or_else(|| RecommenderError::key_not_found(IdKind::Item, item_id))
    }

    pub fn external_user(&self, idx: usize) -> Result<u64> {
        self.id_to_userid
            .get(idx)
            .copied()
            .ok_or_else(|| RecommenderError::key_not_found(IdKind::UserIndex, idx))
    }

    pub fn external_item(&self, idx: usize) -> Result<u64> {
        self.id_to_itemid
            .get(idx)
            .copied()
            .ok_or_else(|| RecommenderError::key_not_found(IdKind::ItemIndex, idx))
    }

    pub fn num_users(&self) -> usize {
        self.id_to_userid.len()
    }

    pub fn num_items(&self) -> usize {
        self.id_to_itemid.len()
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.id_to_userid
    }

    pub fn item_ids(&self) -> &[u64] {
        &self.id_to_itemid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> IdIndex {
        let matrix =
            UserItemMatrix::from_pairs(vec![(30, 7), (10, 9), (20, 7), (10, 1001)]).unwrap();
        IdIndex::from_matrix(&matrix)
    }

    #[test]
    fn test_index_follows_sorted_labels() {
        let index = index();
        assert_eq!(index.internal_user(10).unwrap(), 0);
        assert_eq!(index.internal_user(30).unwrap(), 2);
        assert_eq!(index.internal_item(1001).unwrap(), 2);
        assert_eq!(index.external_item(0).unwrap(), 7);
        assert_eq!(index.num_users(), 3);
        assert_eq!(index.num_items(), 3);
    }

    #[test]
    fn test_round_trips() {
        let index = index();
        for &user in index.user_ids() {
            assert_eq!(index.external_user(index.internal_user(user).unwrap()).unwrap(), user);
        }
        for &item in index.item_ids() {
            assert_eq!(index.external_item(index.internal_item(item).unwrap()).unwrap(), item);
        }
        for idx in 0..index.num_items() {
            assert_eq!(index.internal_item(index.external_item(idx).unwrap()).unwrap(), idx);
        }
    }

    #[test]
    fn test_unknown_keys() {
        let index = index();
        assert!(matches!(
            index.internal_user(99),
            Err(RecommenderError::KeyNotFound { kind: IdKind::User, .. })
        ));
        assert!(matches!(
            index.internal_item(10),
            Err(RecommenderError::KeyNotFound { kind: IdKind::Item, .. })
        ));
        assert!(matches!(
            index.external_user(3),
            Err(RecommenderError::KeyNotFound { kind: IdKind::UserIndex, .. })
        ));
        assert!(matches!(
            index.external_item(3),
            Err(RecommenderError::KeyNotFound { kind: IdKind::ItemIndex, .. })
        ));
    }
}
