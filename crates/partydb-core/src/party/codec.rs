//! Line codec for the party text file.
//!
//! # File Format
//!
//! One party per line, tab separated, every field followed by a tab:
//!
//! ```text
//! <id>\t<name>\t<share_exp>,<share_item>\t<a1>,<c1>,<l1>\t ... <a12>,<c12>,<l12>\t
//! ```
//!
//! All twelve member groups are always written, empty slots as `0,0,0`.
//! The file ends with a single watermark line holding the next free id:
//!
//! ```text
//! <next_id>\t%newid%
//! ```

use std::num::ParseIntError;

use thiserror::Error;

use super::types::{
    truncate_name, MemberSlot, PartyId, PartyRecord, MAX_NAME_BYTES, MAX_PARTY, MAX_PARTY_ID,
};

/// Marker token of the watermark line.
pub const NEWID_MARKER: &str = "%newid%";

/// Longest name the parser accepts before truncation.
pub const MAX_PARSED_NAME: usize = 255;

/// Why a line could not be decoded into a party.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("invalid {field}: {source}")]
    BadNumber {
        field: &'static str,
        source: ParseIntError,
    },

    #[error("party id must be positive")]
    ZeroId,

    #[error("party id {0} is above the largest usable id")]
    IdOutOfRange(PartyId),

    #[error("party name is empty")]
    EmptyName,

    #[error("party name is longer than 255 bytes")]
    NameTooLong,

    #[error("expected 12 member groups, found {0}")]
    TooFewMembers(usize),

    #[error("member group {slot} is malformed: {group:?}")]
    BadMember { slot: usize, group: String },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// Strip the line terminator, if any.
pub fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn parse_int<T: std::str::FromStr<Err = ParseIntError>>(
    text: &str,
    field: &'static str,
) -> Result<T, CodecError> {
    text.trim()
        .parse()
        .map_err(|source| CodecError::BadNumber { field, source })
}

/// Decode a watermark line, returning the id it carries.
///
/// Anything but exactly `<n>\t%newid%` is not a watermark line.
pub fn decode_watermark(line: &str) -> Option<PartyId> {
    let (id, marker) = trim_line_end(line).split_once('\t')?;
    if marker != NEWID_MARKER {
        return None;
    }
    id.parse().ok()
}

/// Encode the watermark line (without newline).
pub fn encode_watermark(next_id: PartyId) -> String {
    format!("{next_id}\t{NEWID_MARKER}")
}

/// Decode one party line.
///
/// Member groups are taken positionally. A line with fewer than
/// [`MAX_PARTY`] groups, or with any group that is not three integers,
/// fails as a whole.
pub fn decode(line: &str) -> Result<PartyRecord, CodecError> {
    let mut fields = trim_line_end(line).split('\t');

    let id: PartyId = parse_int(fields.next().unwrap_or(""), "id")?;
    if id == 0 {
        return Err(CodecError::ZeroId);
    }
    if id > MAX_PARTY_ID {
        return Err(CodecError::IdOutOfRange(id));
    }

    let name = fields.next().ok_or(CodecError::MissingField("name"))?;
    if name.is_empty() {
        return Err(CodecError::EmptyName);
    }
    if name.len() > MAX_PARSED_NAME {
        return Err(CodecError::NameTooLong);
    }
    let stored_name = truncate_name(name, MAX_NAME_BYTES);
    if stored_name.len() < name.len() {
        log::warn!("party {id}: name {name:?} truncated to {stored_name:?}");
    }

    let share = fields.next().ok_or(CodecError::MissingField("share"))?;
    let (exp, item) = share
        .split_once(',')
        .ok_or(CodecError::MissingField("share item"))?;
    let share_exp: i32 = parse_int(exp, "share exp")?;
    let share_item: i32 = parse_int(item, "share item")?;

    let mut members = [MemberSlot::Empty; MAX_PARTY];
    for (slot, member) in members.iter_mut().enumerate() {
        let group = match fields.next() {
            Some(group) if !group.is_empty() => group,
            _ => return Err(CodecError::TooFewMembers(slot)),
        };
        *member = decode_member(group).ok_or_else(|| CodecError::BadMember {
            slot,
            group: group.to_string(),
        })?;
    }

    Ok(PartyRecord {
        id,
        name: stored_name.to_string(),
        share_exp: share_exp != 0,
        share_item,
        members,
    })
}

fn decode_member(group: &str) -> Option<MemberSlot> {
    let mut parts = group.split(',');
    let account_id: u32 = parts.next()?.trim().parse().ok()?;
    let char_id: u32 = parts.next()?.trim().parse().ok()?;
    let leader: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MemberSlot::from_parts(account_id, char_id, leader != 0))
}

/// Encode one party line (without newline).
pub fn encode(party: &PartyRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{},{}\t",
        party.id,
        party.name,
        u8::from(party.share_exp),
        party.share_item
    );

    for slot in &party.members {
        let (account_id, char_id, leader) = slot.parts();
        line.push_str(&format!("{},{},{}\t", account_id, char_id, u8::from(leader)));
    }

    line
}

// ============================================================================
// TESTS
// ============================================================================
