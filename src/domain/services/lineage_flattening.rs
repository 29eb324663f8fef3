//! # Lineage Flattening Service
//!
//! 親リストを固定幅の列に展開するビジネスルール

use crate::domain::entities::lineage::{ColumnLineage, ModelLineage};

/// 親を展開する列数（`parent_1` 〜 `parent_10`）
pub const PARENT_SLOTS: usize = 10;

/// リネージの平坦化サービス
pub struct LineageFlattening;

impl LineageFlattening {
    /// parent_id がモデルであれば `<package>.<model>` を返す
    ///
    /// ```
    /// use lineage_sync::domain::services::lineage_flattening::LineageFlattening;
    ///
    /// assert_eq!(
    ///     LineageFlattening::parent_model_name("model.jaffle_shop.stg_orders"),
    ///     Some("jaffle_shop.stg_orders".to_string())
    /// );
    /// assert_eq!(LineageFlattening::parent_model_name("source.jaffle_shop.raw.orders"), None);
    /// ```
    pub fn parent_model_name(parent_id: &str) -> Option<String> {
        let rest = parent_id.strip_prefix("model.")?;
        let mut parts = rest.split('.');
        let package = parts.next().filter(|p| !p.is_empty())?;
        let model = parts.next().filter(|m| !m.is_empty())?;
        Some(format!("{}.{}", package, model))
    }

    /// モデルの親のうちモデルであるものだけを返す
    pub fn model_parents(model: &ModelLineage) -> Vec<String> {
        model
            .parent_ids
            .iter()
            .flatten()
            .filter_map(|id| Self::parent_model_name(id))
            .collect()
    }

    /// 値を固定長スロットに詰める（不足は None、超過分は切り捨て）
    pub fn to_slots(values: &[String]) -> [Option<String>; PARENT_SLOTS] {
        std::array::from_fn(|i| values.get(i).cloned())
    }

    /// `parent_1..parent_10` の値
    pub fn model_parent_slots(model: &ModelLineage) -> [Option<String>; PARENT_SLOTS] {
        Self::to_slots(&Self::model_parents(model))
    }

    /// `parent_column_1..parent_column_10` の値
    pub fn column_parent_slots(column: &ColumnLineage) -> [Option<String>; PARENT_SLOTS] {
        Self::to_slots(column.parent_columns.as_deref().unwrap_or_default())
    }
}
