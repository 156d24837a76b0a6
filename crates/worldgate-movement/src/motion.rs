//! Movement wire types: motion commands, positions, and the
//! [`MoveToState`] payload.

use worldgate_wire::{FrameReader, FrameWriter, Opcode, OutboundMessage, PlayerId, WireError};

/// A motion command carried in a movement update.
///
/// Unrecognized raw values decode as [`MotionCommand::Other`]; the wire
/// layer is structural only, and later clients may know commands this
/// server does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionCommand {
    /// No command.
    Invalid,
    Ready,
    WalkForward,
    WalkBackwards,
    RunForward,
    TurnRight,
    TurnLeft,
    SideStepRight,
    SideStepLeft,
    /// Sentinel the client sends while parked in the AFK pose.
    AfkState,
    /// A raw value this layer does not know.
    Other(u32),
}

impl MotionCommand {
    /// Maps a raw wire value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Invalid,
            1 => Self::Ready,
            2 => Self::WalkForward,
            3 => Self::WalkBackwards,
            4 => Self::RunForward,
            5 => Self::TurnRight,
            6 => Self::TurnLeft,
            7 => Self::SideStepRight,
            8 => Self::SideStepLeft,
            9 => Self::AfkState,
            other => Self::Other(other),
        }
    }

    /// The raw wire value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Ready => 1,
            Self::WalkForward => 2,
            Self::WalkBackwards => 3,
            Self::RunForward => 4,
            Self::TurnRight => 5,
            Self::TurnLeft => 6,
            Self::SideStepRight => 7,
            Self::SideStepLeft => 8,
            Self::AfkState => 9,
            Self::Other(raw) => raw,
        }
    }
}

/// The held movement key reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldKey {
    /// No key held.
    None,
    /// The run key is held.
    Run,
    /// A raw value this layer does not know.
    Other(u32),
}

impl HoldKey {
    /// Maps a raw wire value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::None,
            2 => Self::Run,
            other => Self::Other(other),
        }
    }

    /// The raw wire value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Run => 2,
            Self::Other(raw) => raw,
        }
    }
}

/// A world position: landcell plus local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub cell: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A decoded client movement command.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveToState {
    pub forward: MotionCommand,
    pub sidestep: MotionCommand,
    pub turn: MotionCommand,
    pub held_key: HoldKey,
    pub position: Position,
    pub standing_long_jump: bool,
    /// Client movement sequence number.
    pub sequence: u32,
}

const FLAG_STANDING_LONG_JUMP: u8 = 0x01;

impl MoveToState {
    /// Decodes a complete movement payload, consuming exactly the frame.
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut r = FrameReader::new(payload);
        let state = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(state)
    }

    /// Reads a movement state from an open reader.
    pub fn read_from(r: &mut FrameReader<'_>) -> Result<Self, WireError> {
        let forward = MotionCommand::from_raw(r.read_u32()?);
        let sidestep = MotionCommand::from_raw(r.read_u32()?);
        let turn = MotionCommand::from_raw(r.read_u32()?);
        let held_key = HoldKey::from_raw(r.read_u32()?);
        let position = Position {
            cell: r.read_u32()?,
            x: r.read_f32()?,
            y: r.read_f32()?,
            z: r.read_f32()?,
        };
        let sequence = r.read_u32()?;
        let flags = r.read_u8()?;
        Ok(Self {
            forward,
            sidestep,
            turn,
            held_key,
            position,
            standing_long_jump: flags & FLAG_STANDING_LONG_JUMP != 0,
            sequence,
        })
    }

    /// Writes this state to an open writer.
    pub fn write_to(&self, w: &mut FrameWriter) {
        w.write_u32(self.forward.as_raw());
        w.write_u32(self.sidestep.as_raw());
        w.write_u32(self.turn.as_raw());
        w.write_u32(self.held_key.as_raw());
        w.write_u32(self.position.cell);
        w.write_f32(self.position.x);
        w.write_f32(self.position.y);
        w.write_f32(self.position.z);
        w.write_u32(self.sequence);
        let mut flags = 0u8;
        if self.standing_long_jump {
            flags |= FLAG_STANDING_LONG_JUMP;
        }
        w.write_u8(flags);
    }

    /// Encodes the payload of a client movement frame. Used by tests.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FrameWriter::new();
        self.write_to(&mut w);
        w.into_vec()
    }
}

/// Encodes a movement broadcast to observers: the mover's id, then the
/// applied state.
pub fn encode_broadcast(mover: PlayerId, state: &MoveToState) -> OutboundMessage {
    let mut w = FrameWriter::new();
    w.write_u32(mover.0);
    state.write_to(&mut w);
    OutboundMessage::new(Opcode::MoveToStateBroadcast, w.into_bytes())
}

/// Decodes a movement broadcast payload. Used by tests.
pub fn decode_broadcast(payload: &[u8]) -> Result<(PlayerId, MoveToState), WireError> {
    let mut r = FrameReader::new(payload);
    let mover = PlayerId(r.read_u32()?);
    let state = MoveToState::read_from(&mut r)?;
    r.finish()?;
    Ok((mover, state))
}
