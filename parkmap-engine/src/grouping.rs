use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parkmap_core::model::{Entity, Row};
use tracing::debug;

use crate::classify::is_polygon_layer;

/// 按 `layer + "_" + entity_handle` 分组。组按首次出现的顺序输出，
/// 组内保持 CSV 行序（即几何点序）。
pub fn group_entities(rows: &[Row]) -> Vec<Entity> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Row>)> = Vec::new();

    for row in rows {
        match slots.entry(row.entity_key()) {
            Entry::Occupied(slot) => groups[*slot.get()].1.push(row.clone()),
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                slot.insert(groups.len());
                groups.push((key, vec![row.clone()]));
            }
        }
    }

    let entities: Vec<Entity> = groups
        .into_iter()
        .filter_map(|(key, rows)| {
            let polygon_layer = rows
                .first()
                .is_some_and(|row| is_polygon_layer(&row.layer));
            Entity::new(key, rows, polygon_layer)
        })
        .collect();
    debug!(rows = rows.len(), entities = entities.len(), "实体分组完成");
    entities
}
