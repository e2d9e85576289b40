// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 可观察状态 (Observable state)
//!
//! 持有一个值, 每次修改后把新值推送给所有订阅者。
//! 订阅者通过 crossbeam 通道接收, 接收端被丢弃后自动清理。

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

struct Inner<T> {
    value: T,
    subscribers: Vec<Sender<T>>,
}

/// 线程安全的可观察值
pub struct Observable<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // 订阅者回调不在锁内执行, 中毒时直接沿用内部值
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 当前值的拷贝
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// 只读访问, 避免整体拷贝
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock().value)
    }

    /// 替换并通知
    pub fn set(&self, value: T) {
        self.update(|v| *v = value);
    }

    /// 原地修改并通知
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut inner = self.lock();
        f(&mut inner.value);
        let snapshot = inner.value.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    /// 订阅后续变化 (不包含当前值)
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_notifies_subscribers() {
        let list: Observable<Vec<String>> = Observable::default();
        let rx = list.subscribe();

        list.update(|v| v.push("a".into()));
        list.update(|v| v.push("b".into()));

        assert_eq!(rx.try_recv().unwrap(), vec!["a".to_string()]);
        assert_eq!(rx.try_recv().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(rx.try_recv().is_err());
        assert_eq!(list.get().len(), 2);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let flag = Observable::new(false);
        let rx1 = flag.subscribe();
        let rx2 = flag.subscribe();
        assert_eq!(flag.subscriber_count(), 2);

        drop(rx1);
        flag.set(true);
        assert_eq!(flag.subscriber_count(), 1);
        assert!(rx2.try_recv().unwrap());
    }

    #[test]
    fn test_clone_shares_value() {
        let a = Observable::new(1u32);
        let b = a.clone();
        b.set(7);
        assert_eq!(a.get(), 7);
        assert_eq!(a.with(|v| *v + 1), 8);
    }
}
