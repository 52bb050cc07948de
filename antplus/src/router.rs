// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::channel::TxHandler;
use crate::drivers::{
    decode_stream, encode_message, parse_frame, DriverError, Frame, RxSlot, TxQueue, TxQueueError,
};
use crate::messages::channel::ChannelResponse;
use crate::messages::config::SetNetworkKey;
use crate::messages::control::{CloseChannel, ResetSystem};
use crate::messages::data::{burst_packets, extended_burst_packets, ChannelIdOutput};
use crate::messages::requested_response::{Capabilities, ChannelState};
use crate::messages::{AntMessage, RxMessage, TransmitableMessage, TxMessageId};
use crate::plus::common::msg_handler::{
    ChannelConfig, ChannelUpdate, ConfigureState, MessageHandler,
};
use crate::plus::profiles::{ProfileDecoder, DEFAULT_WHEEL_CIRCUMFERENCE_MM};
use crate::plus::{NetworkKey, Notification, Profile, PROFILE_COUNT};

use derive_new::new;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum RouterError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Queue(#[from] TxQueueError),
    #[error("no channel {0}")]
    UnknownChannel(u8),
    #[error("channel {0} is still assigned")]
    ChannelBusy(u8),
}

/// Session setup
#[derive(Clone, Debug, PartialEq, new)]
pub struct RouterConfig {
    pub network_key: NetworkKey,
    pub network_number: u8,
    pub wheel_circumference_mm: u16,
    /// Profiles that get a channel opened
    pub profiles: Vec<Profile>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            network_key: NetworkKey::default(),
            network_number: 0,
            wheel_circumference_mm: DEFAULT_WHEEL_CIRCUMFERENCE_MM,
            profiles: Profile::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// First firing after the radio was attached
    Reset,
    Tick,
}

/// Housekeeping timer, fires once after [UpdateTimer::FIRST_DELAY] then every
/// [UpdateTimer::PERIOD]
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateTimer {
    next: Option<Instant>,
    fired: bool,
}

impl UpdateTimer {
    pub const FIRST_DELAY: Duration = Duration::from_millis(500);
    pub const PERIOD: Duration = Duration::from_millis(250);

    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + Self::FIRST_DELAY);
        self.fired = false;
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn poll(&mut self, now: Instant) -> Option<TimerEvent> {
        let next = self.next?;
        if now < next {
            return None;
        }
        self.next = Some(now + Self::PERIOD);
        if self.fired {
            Some(TimerEvent::Tick)
        } else {
            self.fired = true;
            Some(TimerEvent::Reset)
        }
    }
}

/// Task loop of the engine.
///
/// The transport delivers raw bytes into [Router::rx_slot] and sends whatever shows up in
/// [Router::tx_queue]. Every call to [Router::process] decodes what arrived, lets the channel state
/// machines react, queues their commands and pushes notifications into the sink.
pub struct Router<T: TxHandler<Notification>> {
    config: RouterConfig,
    handlers: [MessageHandler; PROFILE_COUNT],
    decoders: [ProfileDecoder; PROFILE_COUNT],
    rx: Arc<RxSlot>,
    tx: Arc<TxQueue>,
    sink: T,
    timer: UpdateTimer,
    capabilities: Option<Capabilities>,
}

impl<T: TxHandler<Notification>> Router<T> {
    pub fn new(config: RouterConfig, sink: T) -> Self {
        let handlers = Profile::ALL.map(|profile| {
            let mut handler =
                MessageHandler::new(ChannelConfig::for_profile(profile, config.network_number));
            handler.set_profile_valid(config.profiles.contains(&profile));
            handler
        });
        let decoders =
            Profile::ALL.map(|profile| ProfileDecoder::new(profile, config.wheel_circumference_mm));
        Self {
            config,
            handlers,
            decoders,
            rx: Arc::new(RxSlot::new()),
            tx: Arc::new(TxQueue::new()),
            sink,
            timer: UpdateTimer::default(),
            capabilities: None,
        }
    }

    /// Where the transport drops received bytes
    pub fn rx_slot(&self) -> Arc<RxSlot> {
        self.rx.clone()
    }

    /// Where the transport picks up frames to send
    pub fn tx_queue(&self) -> Arc<TxQueue> {
        self.tx.clone()
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Reported by the radio in response to the request sent when a channel opens
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.capabilities
    }

    pub fn channel(&self, channel: u8) -> Option<&MessageHandler> {
        self.handlers.get(channel as usize)
    }

    pub fn set_wheel_circumference(&mut self, wheel_circumference_mm: u16) {
        self.config.wheel_circumference_mm = wheel_circumference_mm;
        self.decoders
            .iter_mut()
            .for_each(|d| d.set_wheel_circumference(wheel_circumference_mm));
    }

    /// Start the update timer, the radio is reset on its first firing
    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    /// Returns true if the timer fired
    pub fn on_timer(&mut self, now: Instant) -> bool {
        match self.timer.poll(now) {
            Some(TimerEvent::Reset) => {
                self.reset();
                true
            }
            Some(TimerEvent::Tick) => true,
            None => false,
        }
    }

    /// Ask the radio to reboot, bring up restarts once it reports back
    pub fn reset(&self) -> usize {
        info!("resetting radio");
        self.send(&ResetSystem::new())
    }

    /// Encode and queue `msg`, blocks while the transmit queue is full. Returns the bytes queued,
    /// 0 if the message was rejected.
    pub fn send(&self, msg: &dyn TransmitableMessage) -> usize {
        match encode_message(msg) {
            Ok(encoded) => self.tx.enqueue(&encoded),
            Err(err) => {
                warn!(%err, id = ?msg.get_tx_msg_id(), "unable to encode message");
                0
            }
        }
    }

    /// Non blocking [Router::send]
    pub fn try_send(&self, msg: &dyn TransmitableMessage) -> Result<usize, RouterError> {
        let encoded = encode_message(msg)?;
        Ok(self.tx.try_enqueue(&encoded)?)
    }

    /// Queue `data` as a burst on `channel`, returns the total bytes queued
    pub fn send_burst(&self, channel: u8, data: &[u8]) -> usize {
        burst_packets(channel, data)
            .map(|packet| self.send(&packet))
            .sum()
    }

    pub fn send_extended_burst(
        &self,
        channel: u8,
        channel_id: ChannelIdOutput,
        data: &[u8],
    ) -> usize {
        extended_burst_packets(channel, channel_id, data)
            .map(|packet| self.send(&packet))
            .sum()
    }

    /// Close `channel`. The channel unassigns itself once the radio reports it closed and can then
    /// be brought up again with [Router::open_channel].
    pub fn close_channel(&self, channel: u8) -> Result<usize, RouterError> {
        if self.handlers.get(channel as usize).is_none() {
            return Err(RouterError::UnknownChannel(channel));
        }
        Ok(self.send(&CloseChannel::new(channel)))
    }

    /// Run bring up again on an unassigned channel, starting from the network key
    pub fn open_channel(&mut self, channel: u8) -> Result<usize, RouterError> {
        let index = channel as usize;
        let handler = self
            .handlers
            .get_mut(index)
            .ok_or(RouterError::UnknownChannel(channel))?;
        if handler.state() != ConfigureState::Unassigned {
            return Err(RouterError::ChannelBusy(channel));
        }
        handler.set_profile_valid(true);
        handler.arm();
        self.decoders[index].reset();
        Ok(self.send_network_key())
    }

    fn send_network_key(&self) -> usize {
        self.send(&SetNetworkKey::new(
            self.config.network_number,
            self.config.network_key.key_bytes(),
        ))
    }

    /// Handle everything the transport delivered since the last call, returns the number of frames
    /// decoded
    pub fn process(&mut self) -> usize {
        let mut handled = 0;
        if let Some(buf) = self.rx.take() {
            for frame in decode_stream(&buf) {
                handled += 1;
                match parse_frame(&frame) {
                    Ok(Some(msg)) => self.route_message(&frame, &msg),
                    Ok(None) => debug!(id = frame.message_id, "unhandled message id"),
                    Err(err) => debug!(%err, id = frame.message_id, "unable to parse frame"),
                }
            }
        }
        self.flush();
        handled
    }

    fn flush(&mut self) {
        for i in 0..self.handlers.len() {
            while let Some(msg) = self.handlers[i].send_message() {
                self.send(&msg);
            }
        }
    }

    fn route_message(&mut self, frame: &Frame, msg: &AntMessage) {
        match &msg.message {
            RxMessage::StartUpMessage(startup) => {
                info!(?startup, "radio started");
                self.startup();
            }
            RxMessage::SerialErrorMessage(err) => warn!(?err, "radio reported a serial error"),
            RxMessage::Capabilities(capabilities) => {
                info!(
                    channels = capabilities.max_ant_channels,
                    networks = capabilities.max_networks,
                    "radio capabilities"
                );
                self.capabilities = Some(*capabilities);
            }
            RxMessage::AntVersion(version) => {
                info!(version = version.as_str().unwrap_or("unknown"), "radio version")
            }
            RxMessage::BurstTransferData(_) => debug!("burst data ignored"),
            RxMessage::ChannelResponse(response)
                if response.responded_to() == Some(TxMessageId::NetworkKey) =>
            {
                self.network_key_response(response)
            }
            _ => match frame.channel() {
                Some(channel) => self.route_to_channel(channel, msg),
                None => debug!(id = frame.message_id, "message without channel"),
            },
        }
    }

    fn startup(&mut self) {
        self.handlers.iter_mut().for_each(|h| h.arm());
        self.decoders.iter_mut().for_each(|d| d.reset());
        self.send_network_key();
    }

    /// A network key response carries the network number where other responses have the channel
    fn network_key_response(&mut self, response: &ChannelResponse) {
        let network = response.channel_number;
        if !response.is_ok() {
            warn!(network, code = ?response.message_code(), raw = response.code, "network key rejected");
            return;
        }
        self.handlers
            .iter_mut()
            .filter(|h| h.config().network_number == network)
            .for_each(|h| h.network_key_accepted());
    }

    fn route_to_channel(&mut self, channel: u8, msg: &AntMessage) {
        let index = channel as usize;
        let handler = match self.handlers.get_mut(index) {
            Some(handler) => handler,
            None => {
                warn!(channel, "message for unknown channel dropped");
                return;
            }
        };
        let notification = match handler.receive_message(msg) {
            Some(ChannelUpdate::StatusChanged(status)) => {
                if status == ChannelState::UnAssigned {
                    self.decoders[index].reset();
                }
                Notification::ChannelStatus { channel, status }
            }
            Some(ChannelUpdate::Identified(identity)) => Notification::DeviceId { channel, identity },
            Some(ChannelUpdate::Payload(data)) => {
                let decoder = &mut self.decoders[index];
                match decoder.decode(&data) {
                    Some(reading) => Notification::Reading {
                        channel,
                        profile: decoder.profile(),
                        reading,
                    },
                    None => return,
                }
            }
            None => return,
        };
        if let Err(err) = self.sink.try_send(notification) {
            warn!(%err, channel, "notification dropped");
        }
    }
}
