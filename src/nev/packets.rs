// src/nev/packets.rs
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::header::PacketRef;
use crate::nev::NevFile;
use log::{debug, warn};
use std::collections::HashMap;

/// Packet ids 1..=2048 carry spikes for the electrode of the same id.
const SPIKE_ID_MAX: u16 = 2048;
/// Packet id of free-text comment events.
const COMMENT_ID: u16 = 0xFFFF;

/// Spike packets of one (electrode, unit) pair, in time order.
#[derive(Debug, Clone)]
pub struct SpikeGroup {
    pub electrode_id: u16,
    pub unit_id: u8,
    pub packets: Vec<PacketRef>,
}

/// Result of the single linear scan over the NEV packet stream.
///
/// Spike groups appear in first-seen order; every packet index is sorted by
/// timestamp. Built once during header parsing and frozen afterwards.
#[derive(Debug, Default)]
pub struct PacketScan {
    pub spikes: Vec<SpikeGroup>,
    pub digital: Vec<PacketRef>,
    pub comments: Vec<PacketRef>,
}

impl PacketScan {
    /// Apply the hardware-clock edge case: a channel whose observed clock
    /// values are identically zero is present-but-empty, so its packet index
    /// is cleared rather than treated as data at t = 0.
    pub fn drop_zero_clock_packets(&mut self) {
        for group in &mut self.spikes {
            if !group.packets.is_empty() && group.packets.iter().all(|p| p.ticks == 0) {
                debug!(
                    "spike channel ch{}#{} has only zero clock values; treating as empty",
                    group.electrode_id, group.unit_id
                );
                group.packets.clear();
            }
        }
        for packets in [&mut self.digital, &mut self.comments] {
            if !packets.is_empty() && packets.iter().all(|p| p.ticks == 0) {
                packets.clear();
            }
        }
    }

    /// Raw timestamp extent over every indexed packet, when any exist.
    pub fn ticks_extent(&self) -> Option<(u64, u64)> {
        let mut extent: Option<(u64, u64)> = None;
        let all = self
            .spikes
            .iter()
            .flat_map(|g| g.packets.iter())
            .chain(self.digital.iter())
            .chain(self.comments.iter());
        for p in all {
            extent = Some(match extent {
                None => (p.ticks, p.ticks),
                Some((lo, hi)) => (lo.min(p.ticks), hi.max(p.ticks)),
            });
        }
        extent
    }
}

/// Scan the fixed-size packet stream, discovering (electrode, unit) pairs
/// and building the per-channel byte-offset indexes used by extraction.
///
/// Units are not declared up front; a pair exists once its first packet is
/// seen. A trailing partial packet is logged and ignored.
pub fn scan_packets(cursor: ByteCursor<'_>, file: &NevFile) -> Result<PacketScan> {
    let mut scan = PacketScan::default();
    let mut group_index: HashMap<(u16, u8), usize> = HashMap::new();

    let ts_bytes = file.timestamp_bytes();
    let mut offset = file.data_start;

    while offset + file.packet_size <= cursor.len() {
        let ticks = if ts_bytes == 8 {
            cursor.read_u64(offset)?
        } else {
            cursor.read_u32(offset)? as u64
        };
        let packet_id = cursor.read_u16(offset + file.packet_id_offset())?;
        let packet = PacketRef { offset, ticks };

        match packet_id {
            0 => scan.digital.push(packet),
            id if (1..=SPIKE_ID_MAX).contains(&id) => {
                let unit_id = cursor.read_u8(offset + file.payload_offset())?;
                let slot = *group_index.entry((id, unit_id)).or_insert_with(|| {
                    scan.spikes.push(SpikeGroup {
                        electrode_id: id,
                        unit_id,
                        packets: Vec::new(),
                    });
                    scan.spikes.len() - 1
                });
                scan.spikes[slot].packets.push(packet);
            }
            COMMENT_ID => scan.comments.push(packet),
            other => debug!("skipping packet id {other:#06x} at offset {offset}"),
        }

        offset += file.packet_size;
    }

    if offset < cursor.len() {
        warn!(
            "{} trailing bytes do not form a whole packet; ignored",
            cursor.len() - offset
        );
    }

    for group in &mut scan.spikes {
        group.packets.sort_by_key(|p| (p.ticks, p.offset));
    }
    scan.digital.sort_by_key(|p| (p.ticks, p.offset));
    scan.comments.sort_by_key(|p| (p.ticks, p.offset));

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nev::header::tests_support::minimal_nev;

    fn packet(file: &NevFile, ticks: u32, packet_id: u16, unit: u8) -> Vec<u8> {
        let mut p = vec![0u8; file.packet_size as usize];
        p[..4].copy_from_slice(&ticks.to_le_bytes());
        p[4..6].copy_from_slice(&packet_id.to_le_bytes());
        p[6] = unit;
        p
    }

    fn stream(file: &NevFile, packets: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = vec![0u8; file.data_start as usize];
        for p in packets {
            buf.extend_from_slice(p);
        }
        buf
    }

    #[test]
    fn test_first_seen_discovery_order() {
        let file = minimal_nev(2, 16);
        let buf = stream(
            &file,
            &[
                packet(&file, 10, 7, 1),
                packet(&file, 20, 3, 0),
                packet(&file, 30, 7, 1),
                packet(&file, 40, 7, 2),
            ],
        );
        let scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();

        let keys: Vec<_> = scan
            .spikes
            .iter()
            .map(|g| (g.electrode_id, g.unit_id))
            .collect();
        assert_eq!(keys, vec![(7, 1), (3, 0), (7, 2)]);
        assert_eq!(scan.spikes[0].packets.len(), 2);
    }

    #[test]
    fn test_event_packets_routed_by_id() {
        let file = minimal_nev(2, 16);
        let buf = stream(
            &file,
            &[
                packet(&file, 5, 0, 0),
                packet(&file, 6, 0xFFFF, 0),
                packet(&file, 7, 0, 0),
            ],
        );
        let scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();

        assert_eq!(scan.digital.len(), 2);
        assert_eq!(scan.comments.len(), 1);
        assert!(scan.spikes.is_empty());
    }

    #[test]
    fn test_packets_sorted_by_time() {
        let file = minimal_nev(2, 16);
        let buf = stream(
            &file,
            &[
                packet(&file, 30, 4, 0),
                packet(&file, 10, 4, 0),
                packet(&file, 20, 4, 0),
            ],
        );
        let scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();

        let ticks: Vec<_> = scan.spikes[0].packets.iter().map(|p| p.ticks).collect();
        assert_eq!(ticks, vec![10, 20, 30]);
    }

    #[test]
    fn test_trailing_partial_packet_ignored() {
        let file = minimal_nev(2, 16);
        let mut buf = stream(&file, &[packet(&file, 1, 2, 0)]);
        buf.extend_from_slice(&[0u8; 5]);
        let scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();
        assert_eq!(scan.spikes.len(), 1);
    }

    #[test]
    fn test_zero_clock_channel_emptied() {
        let file = minimal_nev(3, 24);
        let mut p1 = vec![0u8; file.packet_size as usize];
        p1[8..10].copy_from_slice(&9u16.to_le_bytes());
        let p2 = p1.clone();
        let buf = stream(&file, &[p1, p2]);

        let mut scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();
        assert_eq!(scan.spikes[0].packets.len(), 2);

        scan.drop_zero_clock_packets();
        assert_eq!(scan.spikes.len(), 1);
        assert!(scan.spikes[0].packets.is_empty());
    }

    #[test]
    fn test_ticks_extent() {
        let file = minimal_nev(2, 16);
        let buf = stream(&file, &[packet(&file, 15, 0, 0), packet(&file, 3, 8, 0)]);
        let scan = scan_packets(ByteCursor::new(&buf), &file).unwrap();
        assert_eq!(scan.ticks_extent(), Some((3, 15)));

        let empty = PacketScan::default();
        assert_eq!(empty.ticks_extent(), None);
    }
}
