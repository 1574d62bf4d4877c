//! 断点变更通知
//!
//! 每次断点集合变化后广播一次事件，内存视图、反汇编视图等据此刷新。
//! 支持两种订阅方式：同步回调的观察者，以及基于通道的订阅者。

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use super::breakpoints::BreakpointRecord;
use crate::utils::ringbuf::RingBuffer;

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Edited,
    /// 整个列表被替换
    Replaced,
    /// 启用状态翻转
    Toggled,
    /// 无修改的主动刷新
    Refreshed,
}

/// 变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointEvent {
    pub kind: ChangeKind,
    /// 触发本次变更的断点；整体替换时为 None
    pub record: Option<BreakpointRecord>,
}

/// 断点变更观察者
///
/// 回调在发起修改的线程上同步执行，回调内不可再修改断点。
pub trait BreakpointObserver: Send {
    /// 观察者名称
    fn name(&self) -> &'static str;

    fn on_breakpoints_changed(&mut self, event: &BreakpointEvent);
}

/// 变更通知器
pub struct ChangeNotifier {
    observers: Mutex<Vec<Box<dyn BreakpointObserver>>>,
    subscribers: Mutex<Vec<Sender<BreakpointEvent>>>,
    journal: Mutex<RingBuffer<BreakpointEvent>>,
}

impl ChangeNotifier {
    /// `journal_size` 为最近变更记录的容量
    pub fn new(journal_size: usize) -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            journal: Mutex::new(RingBuffer::new(journal_size)),
        }
    }

    pub fn add_observer(&self, observer: Box<dyn BreakpointObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// 订阅变更事件；接收端被丢弃后自动退订
    pub fn subscribe(&self) -> Receiver<BreakpointEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// 广播事件
    pub fn notify(&self, event: BreakpointEvent) {
        for observer in self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter_mut()
        {
            trace!(observer = observer.name(), kind = ?event.kind, "通知观察者");
            observer.on_breakpoints_changed(&event);
        }

        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());

        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_overwrite(event);
    }

    /// 取出最近的变更记录（按发生顺序）
    pub fn take_changes(&self) -> Vec<BreakpointEvent> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct CountingView {
        seen: Arc<Mutex<Vec<ChangeKind>>>,
    }

    impl BreakpointObserver for CountingView {
        fn name(&self) -> &'static str {
            "counting_view"
        }

        fn on_breakpoints_changed(&mut self, event: &BreakpointEvent) {
            self.seen.lock().unwrap().push(event.kind);
        }
    }

    fn event(kind: ChangeKind) -> BreakpointEvent {
        BreakpointEvent { kind, record: None }
    }

    #[test]
    fn test_observers_and_subscribers() {
        let notifier = ChangeNotifier::new(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        notifier.add_observer(Box::new(CountingView { seen: seen.clone() }));
        let rx = notifier.subscribe();

        notifier.notify(event(ChangeKind::Added));
        notifier.notify(event(ChangeKind::Replaced));

        assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::Added, ChangeKind::Replaced]);
        assert_eq!(rx.try_recv().unwrap().kind, ChangeKind::Added);
        assert_eq!(rx.try_recv().unwrap().kind, ChangeKind::Replaced);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_removed() {
        let notifier = ChangeNotifier::new(8);
        let rx = notifier.subscribe();
        let kept = notifier.subscribe();
        assert_eq!(notifier.subscribers.lock().unwrap().len(), 2);

        drop(rx);
        notifier.notify(event(ChangeKind::Refreshed));
        assert_eq!(notifier.subscribers.lock().unwrap().len(), 1);
        assert_eq!(kept.try_recv().unwrap().kind, ChangeKind::Refreshed);
    }

    #[test]
    fn test_journal_bounded() {
        let notifier = ChangeNotifier::new(2);
        notifier.notify(event(ChangeKind::Added));
        notifier.notify(event(ChangeKind::Removed));
        notifier.notify(event(ChangeKind::Edited));

        let kinds: Vec<_> = notifier.take_changes().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Removed, ChangeKind::Edited]);
        assert!(notifier.take_changes().is_empty());
    }
}
