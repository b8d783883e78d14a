use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Время жизни экрана, к которому относятся асинхронные результаты.
///
/// Результаты, пришедшие после [`ViewScope::close`], не применяются к
/// локальному состоянию. Эпоха растёт при каждой загрузке данных экрана;
/// локальное состояние прошлой эпохи считается устаревшим.
#[derive(Debug, Clone)]
pub struct ViewScope {
    active: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Начинает новую эпоху и возвращает её номер.
    pub fn advance(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Закрывает экран для всех копий этого значения.
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
