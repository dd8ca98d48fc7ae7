//! Servo channel identifiers and a fixed-size per-channel container.
//!
//! Boards and the wire protocol number servos from 1; internally every
//! per-channel array is indexed through [`Channel`], so an index is validated
//! once at the boundary and never again.

use core::ops::{Index, IndexMut};

use crate::config::CHANNEL_COUNT;

/// One physical servo output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    S1 = 0,
    S2 = 1,
    S3 = 2,
    S4 = 3,
    S5 = 4,
    S6 = 5,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::S1,
        Channel::S2,
        Channel::S3,
        Channel::S4,
        Channel::S5,
        Channel::S6,
    ];

    /// Zero-based position in per-channel arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// One-based number as printed on the board.
    #[inline]
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Map a one-based channel number; anything outside `1..=CHANNEL_COUNT` is `None`.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => None,
            n => Self::from_index(n as usize - 1),
        }
    }
}

/// One value per [`Channel`], stored inline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap<T>([T; CHANNEL_COUNT]);

impl<T> ChannelMap<T> {
    pub const fn new(values: [T; CHANNEL_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_array(&self) -> &[T; CHANNEL_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Channel, &mut T)> {
        Channel::ALL.into_iter().zip(self.0.iter_mut())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ChannelMap<U> {
        ChannelMap(self.0.map(f))
    }
}

impl<T: Copy> ChannelMap<T> {
    pub const fn splat(value: T) -> Self {
        Self([value; CHANNEL_COUNT])
    }
}

impl<T> Index<Channel> for ChannelMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, channel: Channel) -> &T {
        &self.0[channel.index()]
    }
}

impl<T> IndexMut<Channel> for ChannelMap<T> {
    #[inline]
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.index()]
    }
}
