//! Realtime Feed
//!
//! `ChangeFeed` over the hosted realtime websocket. One socket per
//! subscription; dropping the subscription leaves the channel and closes it.
//! When the socket closes on its own the subscription ends, and the next
//! subscribe waits out a backoff first.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::future::{AbortHandle, Abortable};
use futures::StreamExt;
use gloo_timers::future::{IntervalStream, TimeoutFuture};
use leptos::task::spawn_local;
use log::{debug, info, warn};
use shopping_sync::gateway::realtime::{
    decode_inbound, heartbeat_frame, join_frame, leave_frame, reconnect_delay_ms, topic, Frame,
    Inbound, RefCounter,
};
use shopping_sync::gateway::{ChangeFeed, ChannelSpec, Subscription};
use shopping_sync::{RemoteConfig, StoreError, StoreResult};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

pub struct RealtimeFeed {
    config: RemoteConfig,
    /// Sockets dropped since the last successful join
    failures: Rc<Cell<u32>>,
}

impl RealtimeFeed {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            failures: Rc::new(Cell::new(0)),
        }
    }
}

fn send_frame(socket: &WebSocket, frame: &Frame) {
    let text = match frame.to_text() {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not encode {} frame: {}", frame.event, e);
            return;
        }
    };
    if let Err(e) = socket.send_with_str(&text) {
        warn!("Realtime send failed: {:?}", e);
    }
}

fn js_error(e: JsValue) -> StoreError {
    StoreError::Network(format!("{:?}", e))
}

#[async_trait(?Send)]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&self, channel: &ChannelSpec) -> StoreResult<Subscription> {
        let delay = reconnect_delay_ms(self.failures.get());
        if delay > 0 {
            debug!("Waiting {}ms before reconnecting realtime", delay);
            TimeoutFuture::new(delay).await;
        }

        let socket = WebSocket::new(&self.config.realtime_url()).map_err(js_error)?;
        let refs = Rc::new(RefCell::new(RefCounter::default()));
        let channel_topic = topic(channel);
        let (tx, notices) = mpsc::unbounded();
        // Dropping the sender ends the subscription stream
        let tx = Rc::new(RefCell::new(Some(tx)));

        let join = join_frame(channel, &self.config.anon_key, refs.borrow_mut().next());
        let on_open = {
            let socket = socket.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| send_frame(&socket, &join))
        };

        let on_message = {
            let channel_topic = channel_topic.clone();
            let tx = Rc::clone(&tx);
            let failures = Rc::clone(&self.failures);
            Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
                let Some(text) = ev.data().as_string() else {
                    return;
                };
                match decode_inbound(&text, &channel_topic) {
                    Ok(Inbound::Change(notice)) => {
                        if let Some(tx) = tx.borrow().as_ref() {
                            let _ = tx.unbounded_send(notice);
                        }
                    }
                    Ok(Inbound::JoinReply { ok: true, .. }) => {
                        failures.set(0);
                        info!("Joined {}", channel_topic)
                    }
                    Ok(Inbound::JoinReply { ok: false, detail }) => {
                        warn!("Join of {} refused: {}", channel_topic, detail);
                        failures.set(failures.get().saturating_add(1));
                        tx.borrow_mut().take();
                    }
                    Ok(Inbound::Error(message)) => warn!("Realtime error on {}: {}", channel_topic, message),
                    Ok(Inbound::Closed) => {
                        debug!("{} closed by server", channel_topic);
                        failures.set(failures.get().saturating_add(1));
                        tx.borrow_mut().take();
                    }
                    Ok(Inbound::Ignored) => {}
                    Err(e) => warn!("Unreadable realtime frame: {}", e),
                }
            })
        };

        let on_close = {
            let tx = Rc::clone(&tx);
            let failures = Rc::clone(&self.failures);
            Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
                debug!("Realtime socket closed ({})", ev.code());
                failures.set(failures.get().saturating_add(1));
                tx.borrow_mut().take();
            })
        };

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let (heartbeat, registration) = AbortHandle::new_pair();
        let beats = {
            let socket = socket.clone();
            let refs = Rc::clone(&refs);
            let period = self.config.heartbeat_secs.saturating_mul(1000);
            async move {
                let mut ticks = IntervalStream::new(period);
                while ticks.next().await.is_some() {
                    if socket.ready_state() == WebSocket::OPEN {
                        send_frame(&socket, &heartbeat_frame(refs.borrow_mut().next()));
                    }
                }
            }
        };
        spawn_local(async move {
            let _ = Abortable::new(beats, registration).await;
        });

        let channel = channel.clone();
        Ok(Subscription::new(notices, move || {
            heartbeat.abort();
            if socket.ready_state() == WebSocket::OPEN {
                send_frame(&socket, &leave_frame(&channel, refs.borrow_mut().next()));
            }
            socket.set_onopen(None);
            socket.set_onmessage(None);
            socket.set_onclose(None);
            if let Err(e) = socket.close() {
                warn!("Closing realtime socket failed: {:?}", e);
            }
            drop((on_open, on_message, on_close));
            debug!("Left {}", channel_topic);
        }))
    }
}
