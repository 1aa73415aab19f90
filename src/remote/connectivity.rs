//! Browser Connectivity
//!
//! `navigator.onLine` plus the window `online` / `offline` events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::stream::{LocalBoxStream, Stream, StreamExt};
use log::warn;
use shopping_sync::sync::{ConnectivityEvent, ConnectivityObserver};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, Window};

pub struct BrowserConnectivity;

impl ConnectivityObserver for BrowserConnectivity {
    fn is_online(&self) -> bool {
        web_sys::window().map_or(true, |w| w.navigator().on_line())
    }

    fn watch(&self) -> LocalBoxStream<'static, ConnectivityEvent> {
        let (tx, events) = mpsc::unbounded();
        let Some(window) = web_sys::window() else {
            return events.boxed_local();
        };

        let listener = |event: ConnectivityEvent| {
            let tx = tx.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                let _ = tx.unbounded_send(event);
            })
        };
        let online = listener(ConnectivityEvent::Online);
        let offline = listener(ConnectivityEvent::Offline);

        for (name, callback) in [("online", &online), ("offline", &offline)] {
            if let Err(e) = window.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref()) {
                warn!("Could not listen for {} events: {:?}", name, e);
            }
        }

        Box::pin(Watch {
            events,
            window,
            online,
            offline,
        })
    }
}

/// Connectivity events; removes the window listeners when dropped
struct Watch {
    events: UnboundedReceiver<ConnectivityEvent>,
    window: Window,
    online: Closure<dyn FnMut(Event)>,
    offline: Closure<dyn FnMut(Event)>,
}

impl Stream for Watch {
    type Item = ConnectivityEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ConnectivityEvent>> {
        self.events.poll_next_unpin(cx)
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        for (name, callback) in [("online", &self.online), ("offline", &self.offline)] {
            let _ = self
                .window
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        }
    }
}
