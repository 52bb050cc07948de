// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::channel::duration_to_search_timeout;
use crate::messages::channel::{ChannelEvent, ChannelResponse, MessageCode};
use crate::messages::config::{
    AssignChannel, ChannelId, ChannelPeriod, ChannelRfFrequency, ChannelType, DeviceType,
    SearchTimeout, SearchWaveform, SearchWaveformValue, TransmissionType, UnAssignChannel,
};
use crate::messages::control::{OpenChannel, RequestMessage, RequestableMessageId};
use crate::messages::data::DATA_PAYLOAD_SIZE;
use crate::messages::requested_response::{ChannelState, ChannelStatus};
use crate::messages::{AntMessage, RxMessage, TxMessage, TxMessageId};
use crate::plus::{DeviceIdentity, Profile, NETWORK_RF_FREQUENCY};

use arrayvec::ArrayVec;
use core::time::Duration;
use packed_struct::prelude::{EnumCatchAll, PrimitiveEnum};
use tracing::{debug, info, warn};

/// Commands a handler can hold back for the router at once
const PENDING_MESSAGES: usize = 8;
const DEFAULT_SEARCH_WAVEFORM: u16 = 0x0053;

/// Where a channel is in its bring up
///
/// Each configuration state names the last step the radio accepted, the handler is waiting on the
/// response to the command that follows it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigureState {
    #[default]
    Unassigned,
    KeyPending,
    Assigned,
    PeriodSet,
    TimeoutSet,
    FreqSet,
    WaveformSet,
    IdSet,
    Open,
    Tracking,
    SearchTimeout,
    Closed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    pub channel: u8,
    /// 0 pairs with any master
    pub device_number: u16,
    pub device_type: DeviceType,
    pub transmission_type: TransmissionType,
    pub channel_type: ChannelType,
    pub network_number: u8,
    pub channel_period: u16,
    pub radio_frequency: u8,
    pub timeout_duration: u8,
    pub search_waveform: u16,
}

impl ChannelConfig {
    /// Wildcard slave setup for `profile` on its own channel
    pub fn for_profile(profile: Profile, network_number: u8) -> Self {
        Self {
            channel: profile.channel(),
            device_number: 0,
            device_type: DeviceType::from_id(profile.device_type()),
            transmission_type: TransmissionType::new_wildcard(),
            channel_type: ChannelType::BidirectionalSlave,
            network_number,
            channel_period: profile.channel_period(),
            radio_frequency: NETWORK_RF_FREQUENCY,
            timeout_duration: duration_to_search_timeout(Duration::from_secs(640)),
            search_waveform: DEFAULT_SEARCH_WAVEFORM,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChannelFlags {
    /// Channel id already requested since the last (re)start
    pub chan_id_once: bool,
    pub channel_status: ChannelState,
    /// Last status reported to the application
    pub channel_status_old: Option<ChannelState>,
    pub key_accepted: bool,
    /// Channel takes part in bring up
    pub profile_valid: bool,
}

impl Default for ChannelFlags {
    fn default() -> Self {
        Self {
            chan_id_once: false,
            channel_status: ChannelState::UnAssigned,
            channel_status_old: None,
            key_accepted: false,
            profile_valid: true,
        }
    }
}

/// What a handler wants the router to act on after a message
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelUpdate {
    StatusChanged(ChannelState),
    Identified(DeviceIdentity),
    /// Broadcast payload for the profile decoder
    Payload([u8; DATA_PAYLOAD_SIZE]),
}

/// Drives one channel through configuration and tracks what the radio reports about it.
///
/// The handler never talks to the radio itself, outbound commands are pulled by the router with
/// [MessageHandler::send_message]. Configuration commands go out one at a time, the next one only
/// after the radio accepted the previous.
pub struct MessageHandler {
    config: ChannelConfig,
    flags: ChannelFlags,
    configure_state: ConfigureState,
    /// Config message handed out, waiting for its response
    configure_pending_response: bool,
    /// Unassign sent after the radio closed the channel, waiting for its response
    unassign_pending: bool,
    pending: ArrayVec<TxMessage, PENDING_MESSAGES>,
    identity: Option<DeviceIdentity>,
}

impl MessageHandler {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            flags: ChannelFlags::default(),
            configure_state: ConfigureState::Unassigned,
            configure_pending_response: false,
            unassign_pending: false,
            pending: ArrayVec::new(),
            identity: None,
        }
    }

    pub fn get_channel(&self) -> u8 {
        self.config.channel
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn flags(&self) -> &ChannelFlags {
        &self.flags
    }

    pub fn state(&self) -> ConfigureState {
        self.configure_state
    }

    /// Identity of the paired master, `None` until the radio reported it
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.identity
    }

    pub fn is_tracking(&self) -> bool {
        self.configure_state == ConfigureState::Tracking
    }

    pub fn set_profile_valid(&mut self, valid: bool) {
        self.flags.profile_valid = valid;
    }

    /// Restart bring up, the network key has to be accepted before anything else is sent
    pub fn arm(&mut self) {
        if !self.flags.profile_valid {
            return;
        }
        self.flags = ChannelFlags {
            profile_valid: true,
            ..ChannelFlags::default()
        };
        self.configure_state = ConfigureState::KeyPending;
        self.configure_pending_response = false;
        self.unassign_pending = false;
        self.pending.clear();
        debug!(channel = self.config.channel, "channel armed");
    }

    /// Network key for this channel's network was accepted
    pub fn network_key_accepted(&mut self) {
        if self.configure_state != ConfigureState::KeyPending || self.flags.key_accepted {
            return;
        }
        info!(channel = self.config.channel, "network key accepted");
        self.flags.key_accepted = true;
        self.configure_pending_response = false;
    }

    /// Next command for the radio, if any
    pub fn send_message(&mut self) -> Option<TxMessage> {
        if let Some(msg) = self.pending.pop_at(0) {
            return Some(msg);
        }
        if self.configure_pending_response {
            return None;
        }
        let msg = self.transmit_config()?;
        self.configure_pending_response = true;
        Some(msg)
    }

    fn queue(&mut self, msg: TxMessage) {
        if self.pending.try_push(msg).is_err() {
            warn!(channel = self.config.channel, "pending command queue full, dropping");
        }
    }

    fn request(&mut self, message_id: RequestableMessageId) {
        self.queue(RequestMessage::new(self.config.channel, message_id).into());
    }

    fn assign_type(&self) -> ChannelType {
        if self.config.channel_type.is_master() {
            ChannelType::MasterTransmitOnly
        } else {
            self.config.channel_type
        }
    }

    fn transmit_config(&self) -> Option<TxMessage> {
        let channel = self.config.channel;
        let msg: TxMessage = match self.configure_state {
            ConfigureState::KeyPending if self.flags.key_accepted => {
                AssignChannel::new(channel, self.assign_type(), self.config.network_number).into()
            }
            ConfigureState::Assigned => {
                ChannelPeriod::new(channel, self.config.channel_period).into()
            }
            ConfigureState::PeriodSet => {
                SearchTimeout::new(channel, self.config.timeout_duration).into()
            }
            ConfigureState::TimeoutSet => {
                ChannelRfFrequency::new(channel, self.config.radio_frequency).into()
            }
            ConfigureState::FreqSet => {
                let waveform = self.config.search_waveform;
                let waveform = match SearchWaveformValue::from_primitive(waveform) {
                    Some(known) => EnumCatchAll::Enum(known),
                    None => EnumCatchAll::CatchAll(waveform),
                };
                SearchWaveform::new(channel, waveform).into()
            }
            ConfigureState::WaveformSet => ChannelId::new(
                channel,
                self.config.device_number,
                self.config.device_type,
                self.config.transmission_type,
            )
            .into(),
            ConfigureState::IdSet => OpenChannel::new(channel).into(),
            _ => return None,
        };
        Some(msg)
    }

    /// Command whose acceptance moves the channel on
    pub fn awaited(&self) -> Option<TxMessageId> {
        match self.configure_state {
            ConfigureState::KeyPending if self.flags.key_accepted => {
                Some(TxMessageId::AssignChannel)
            }
            ConfigureState::KeyPending => Some(TxMessageId::NetworkKey),
            ConfigureState::Assigned => Some(TxMessageId::ChannelPeriod),
            ConfigureState::PeriodSet => Some(TxMessageId::SearchTimeout),
            ConfigureState::TimeoutSet => Some(TxMessageId::ChannelRfFrequency),
            ConfigureState::FreqSet => Some(TxMessageId::SearchWaveform),
            ConfigureState::WaveformSet => Some(TxMessageId::ChannelId),
            ConfigureState::IdSet => Some(TxMessageId::OpenChannel),
            _ => None,
        }
    }

    fn advance(&mut self) {
        let next = match self.configure_state {
            ConfigureState::KeyPending => ConfigureState::Assigned,
            ConfigureState::Assigned => ConfigureState::PeriodSet,
            ConfigureState::PeriodSet => ConfigureState::TimeoutSet,
            ConfigureState::TimeoutSet => ConfigureState::FreqSet,
            ConfigureState::FreqSet => ConfigureState::WaveformSet,
            ConfigureState::WaveformSet => ConfigureState::IdSet,
            ConfigureState::IdSet => ConfigureState::Open,
            state => state,
        };
        debug!(
            channel = self.config.channel,
            from = ?self.configure_state,
            to = ?next,
            "configuration step accepted"
        );
        self.configure_state = next;
        self.configure_pending_response = false;

        if next == ConfigureState::Open {
            info!(channel = self.config.channel, "channel open");
            self.request(RequestableMessageId::ChannelStatus);
            self.request(RequestableMessageId::Capabilities);
            self.request(RequestableMessageId::AntVersion);
        }
    }

    pub fn receive_message(&mut self, msg: &AntMessage) -> Option<ChannelUpdate> {
        match &msg.message {
            RxMessage::ChannelResponse(msg) => self.handle_response(msg),
            RxMessage::ChannelEvent(msg) => self.handle_event(msg),
            RxMessage::ChannelId(msg) => self.handle_id(msg),
            RxMessage::ChannelStatus(msg) => self.handle_status(msg),
            RxMessage::BroadcastData(msg) => self.handle_data(&msg.data),
            RxMessage::AcknowledgedData(msg) => self.handle_data(&msg.data),
            _ => None,
        }
    }

    fn handle_response(&mut self, msg: &ChannelResponse) -> Option<ChannelUpdate> {
        let channel = self.config.channel;
        let responded_to = match msg.responded_to() {
            Some(id) => id,
            None => {
                debug!(channel, id = msg.message_id, "response to unknown command");
                return None;
            }
        };

        match responded_to {
            TxMessageId::CloseChannel => return self.closed(),
            TxMessageId::UnAssignChannel => return self.unassigned(msg),
            _ => (),
        }

        if self.awaited() != Some(responded_to) {
            debug!(channel, ?responded_to, state = ?self.configure_state, "stale response ignored");
            return None;
        }
        if !msg.is_ok() {
            warn!(channel, ?responded_to, code = ?msg.message_code(), raw = msg.code, "command rejected");
            return None;
        }
        self.advance();
        None
    }

    fn handle_event(&mut self, msg: &ChannelEvent) -> Option<ChannelUpdate> {
        let channel = self.config.channel;
        match msg.message_code() {
            Some(MessageCode::EventChannelClosed) => {
                let update = self.closed();
                // the radio only releases the slot once the channel is closed
                if !self.unassign_pending {
                    self.unassign_pending = true;
                    self.queue(UnAssignChannel::new(channel).into());
                }
                update
            }
            Some(MessageCode::EventRxSearchTimeout) => {
                info!(channel, "search timed out");
                self.configure_state = ConfigureState::SearchTimeout;
                None
            }
            code => {
                debug!(channel, ?code, raw = msg.code, "channel event");
                None
            }
        }
    }

    fn closed(&mut self) -> Option<ChannelUpdate> {
        info!(channel = self.config.channel, "channel closed");
        self.flags.key_accepted = false;
        self.configure_state = ConfigureState::Closed;
        self.configure_pending_response = false;
        self.set_status(ChannelState::UnAssigned)
    }

    fn unassigned(&mut self, msg: &ChannelResponse) -> Option<ChannelUpdate> {
        let channel = self.config.channel;
        if !self.unassign_pending {
            debug!(channel, "unexpected unassign response ignored");
            return None;
        }
        self.unassign_pending = false;
        if !msg.is_ok() {
            warn!(channel, code = ?msg.message_code(), raw = msg.code, "unassign rejected");
            return None;
        }
        info!(channel, "channel unassigned");
        self.configure_state = ConfigureState::Unassigned;
        None
    }

    fn set_status(&mut self, status: ChannelState) -> Option<ChannelUpdate> {
        self.flags.channel_status = status;
        if self.flags.channel_status_old == Some(status) {
            return None;
        }
        self.flags.channel_status_old = Some(status);
        Some(ChannelUpdate::StatusChanged(status))
    }

    fn handle_status(&mut self, msg: &ChannelStatus) -> Option<ChannelUpdate> {
        if msg.channel_state == ChannelState::Tracking
            && matches!(
                self.configure_state,
                ConfigureState::Open | ConfigureState::SearchTimeout
            )
        {
            self.configure_state = ConfigureState::Tracking;
        }
        self.set_status(msg.channel_state)
    }

    fn handle_id(&mut self, msg: &ChannelId) -> Option<ChannelUpdate> {
        let identity = DeviceIdentity {
            device_number: msg.device_number,
            device_type: msg.device_type,
            transmission_type: msg.transmission_type,
        };
        info!(
            channel = self.config.channel,
            device_number = identity.device_number,
            device_type = *identity.device_type.device_type_id,
            "device identified"
        );
        self.identity = Some(identity);
        Some(ChannelUpdate::Identified(identity))
    }

    fn handle_data(&mut self, data: &[u8; DATA_PAYLOAD_SIZE]) -> Option<ChannelUpdate> {
        if !self.flags.chan_id_once {
            self.flags.chan_id_once = true;
            self.request(RequestableMessageId::ChannelId);
        }
        Some(ChannelUpdate::Payload(*data))
    }
}
