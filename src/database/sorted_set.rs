use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;

/// Отсортированное множество: элемент → score, упорядочено по (score, элемент).
///
/// При равных score порядок определяется лексикографически по элементу,
/// как в Redis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<String, OrderedFloat<f64>>,
    ordered: BTreeSet<(OrderedFloat<f64>, String)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Вставляет элемент или обновляет его score.
    ///
    /// Возвращает `true`, если элемента раньше не было.
    pub fn insert(
        &mut self,
        member: &str,
        score: f64,
    ) -> bool {
        let score = OrderedFloat(score);
        match self.scores.insert(member.to_string(), score) {
            Some(old) => {
                self.ordered.remove(&(old, member.to_string()));
                self.ordered.insert((score, member.to_string()));
                false
            }
            None => {
                self.ordered.insert((score, member.to_string()));
                true
            }
        }
    }

    /// Удаляет элемент. Возвращает `true`, если он был.
    pub fn remove(
        &mut self,
        member: &str,
    ) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(score, member.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn score(
        &self,
        member: &str,
    ) -> Option<f64> {
        self.scores.get(member).map(|s| s.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Элементы по рангу в диапазоне `[start, stop]` включительно, от
    /// меньшего score к большему.
    ///
    /// Отрицательные индексы считаются с конца (`-1` означает последний элемент).
    pub fn range_by_rank(
        &self,
        start: i64,
        stop: i64,
    ) -> Vec<String> {
        let len = self.len() as i64;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

        if len == 0 || start > stop || start >= len {
            return Vec::new();
        }

        self.ordered
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|(_, member)| member.clone())
            .collect()
    }
}
