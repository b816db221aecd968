//! DOM イベントの最小実装（EventTarget / Event）
//!
//! 実ブラウザの `document.addEventListener("includes:ready", fn)` と
//! `document.dispatchEvent(new CustomEvent("includes:ready"))` に相当する部分です。
//! - ペイロード（detail）は持たず、イベント名だけを運びます。
//! - バブリングやキャプチャはありません。登録先のターゲットにだけ届きます。
//!
//! 設計メモ
//! - リスナーは `Rc<dyn Fn(&Event)>` で保持します。配信中にリスナーが新しいリスナーを
//!   登録しても借用が衝突しないよう、呼び出し前に対象を複製してから `RefCell` を解放します。
//! - `add_event_listener_once` は `{ once: true }` 相当。配信時に一覧から外してから呼びます。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    event_type: String,
}

impl Event {
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

type Listener = Rc<dyn Fn(&Event)>;

struct Registration {
    event_type: String,
    listener: Listener,
    once: bool,
}

#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<Vec<Registration>>,
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.listeners.borrow_mut().push(Registration {
            event_type: event_type.to_string(),
            listener: Rc::new(listener),
            once: false,
        });
    }

    /// 最初の1回だけ呼ばれるリスナーを登録する
    ///
    /// `FnOnce` を `Fn` として保持するため、中身を `RefCell<Option<F>>` に包んで
    /// 1回目の呼び出しで取り出します。
    pub fn add_event_listener_once<F>(&self, event_type: &str, listener: F)
    where
        F: FnOnce(&Event) + 'static,
    {
        let slot = RefCell::new(Some(listener));
        self.listeners.borrow_mut().push(Registration {
            event_type: event_type.to_string(),
            listener: Rc::new(move |event: &Event| {
                if let Some(f) = slot.borrow_mut().take() {
                    f(event);
                }
            }),
            once: true,
        });
    }

    /// イベントを配信し、呼び出したリスナーの数を返す
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let targets: Vec<Listener> = {
            let mut listeners = self.listeners.borrow_mut();
            let targets = listeners
                .iter()
                .filter(|r| r.event_type == event.event_type)
                .map(|r| r.listener.clone())
                .collect();
            listeners.retain(|r| !(r.once && r.event_type == event.event_type));
            targets
        };

        for listener in &targets {
            listener(event);
        }

        targets.len()
    }
}
