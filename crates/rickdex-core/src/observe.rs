//! Current-value holder with explicit subscribe/notify.
//!
//! A new subscriber is called immediately with the current value, then again
//! on every [`Observable::set`]. Everything runs on the caller's thread.
//!
//! Emission is not reentrant. A `set` made from inside a callback only
//! records the new value; the running emission then abandons its stale round
//! and starts over with the latest value, so every subscriber's last delivery
//! is always the current value.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Subscribers<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
    /// Bumped on every publish.
    revision: Cell<u64>,
    emitting: Cell<bool>,
}

/// Clears the emitting flag even if a callback panics.
struct EmitGuard<'a>(&'a Cell<bool>);

impl Drop for EmitGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Observable current value.
pub struct Observable<T> {
    value: RefCell<T>,
    subscribers: Rc<Subscribers<T>>,
}

impl<T: Clone + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: Rc::new(Subscribers {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
                revision: Cell::new(0),
                emitting: Cell::new(false),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning.
    ///
    /// The borrow must be released before calling [`Observable::set`].
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.value.borrow()
    }

    /// Replace the value and notify every subscriber.
    ///
    /// Subscribers see a snapshot, so a callback may read or set this
    /// observable again without tripping a borrow. A nested call returns
    /// before delivery; the outer emission delivers the new value.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.notify();
    }

    /// Push the current value to every subscriber.
    pub fn notify(&self) {
        let subscribers = &self.subscribers;
        subscribers
            .revision
            .set(subscribers.revision.get().wrapping_add(1));
        if subscribers.emitting.replace(true) {
            return;
        }
        let _guard = EmitGuard(&subscribers.emitting);

        loop {
            let revision = subscribers.revision.get();
            let snapshot = self.get();
            let callbacks: Vec<Callback<T>> = subscribers
                .entries
                .borrow()
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect();
            for callback in callbacks {
                if subscribers.revision.get() != revision {
                    break;
                }
                callback(&snapshot);
            }
            if subscribers.revision.get() == revision {
                break;
            }
        }
    }

    /// Register `callback`; it is invoked right away with the current value.
    ///
    /// The returned [`Subscription`] unsubscribes on drop.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = self.subscribers.next_id.get();
        self.subscribers.next_id.set(id + 1);

        let callback: Callback<T> = Rc::new(callback);
        self.subscribers
            .entries
            .borrow_mut()
            .push((id, Rc::clone(&callback)));

        let snapshot = self.get();
        callback(&snapshot);

        let weak: Weak<Subscribers<T>> = Rc::downgrade(&self.subscribers);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    subscribers
                        .entries
                        .borrow_mut()
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.entries.borrow().len())
            .finish()
    }
}

/// Handle for an active subscription. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the subscription alive for as long as the observable lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Observable;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn new_subscriber_receives_current_value() {
        let observable = Observable::new(7_u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = observable.subscribe(move |v| sink.borrow_mut().push(*v));
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn set_pushes_to_all_subscribers() {
        let observable = Observable::new(0_u32);
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let (sa, sb) = (Rc::clone(&a), Rc::clone(&b));
        let _a = observable.subscribe(move |v| sa.borrow_mut().push(*v));
        let _b = observable.subscribe(move |v| sb.borrow_mut().push(*v));

        observable.set(1);
        observable.set(2);

        assert_eq!(*a.borrow(), vec![0, 1, 2]);
        assert_eq!(*b.borrow(), vec![0, 1, 2]);
        assert_eq!(observable.get(), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let observable = Observable::new(0_u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = observable.subscribe(move |v| sink.borrow_mut().push(*v));
        assert_eq!(observable.subscriber_count(), 1);
        drop(sub);
        assert_eq!(observable.subscriber_count(), 0);

        observable.set(5);
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let observable = Observable::new(0_u32);
        observable.subscribe(|_| {}).detach();
        assert_eq!(observable.subscriber_count(), 1);
    }

    #[test]
    fn callback_may_read_back_during_notify() {
        let observable = Rc::new(Observable::new(String::from("a")));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (inner, sink) = (Rc::clone(&observable), Rc::clone(&seen));
        let _sub = observable.subscribe(move |v| {
            sink.borrow_mut().push(format!("{v}/{}", inner.get()));
        });
        observable.set("b".into());
        assert_eq!(*seen.borrow(), vec!["a/a", "b/b"]);
    }

    #[test]
    fn nested_set_delivers_latest_value_last() {
        let observable = Rc::new(Observable::new(0_u32));
        let inner = Rc::clone(&observable);
        let _bump = observable.subscribe(move |v| {
            if *v == 1 {
                inner.set(2);
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _watch = observable.subscribe(move |v| sink.borrow_mut().push(*v));

        observable.set(1);

        assert_eq!(observable.get(), 2);
        // The stale round is abandoned before reaching the watcher.
        assert_eq!(*seen.borrow(), vec![0, 2]);
    }

    #[test]
    fn set_from_last_subscriber_reaches_earlier_ones() {
        let observable = Rc::new(Observable::new(0_u32));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _watch = observable.subscribe(move |v| sink.borrow_mut().push(*v));
        let inner = Rc::clone(&observable);
        let _bump = observable.subscribe(move |v| {
            if *v == 1 {
                inner.set(2);
            }
        });

        observable.set(1);

        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(seen.borrow().last().copied(), Some(observable.get()));
    }
}
