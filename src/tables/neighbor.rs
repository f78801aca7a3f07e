//! Kernel neighbor table parser.
//!
//! Expected layout (`/proc/net/arp`):
//!
//! ```text
//! IP address       HW type     Flags       HW address            Mask     Device
//! 192.168.1.100    0x1         0x2         aa:bb:cc:dd:ee:01     *        br-lan
//! ```

use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};

use super::MacAddr;

/// `ATF_COMPLETE`: the kernel holds a resolved hardware address.
pub const FLAG_COMPLETE: u32 = 0x2;

const MIN_COLUMNS: usize = 6;

/// One row of the neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub mac: MacAddr,
    pub ip: String,
    pub interface: String,
    pub reachable: bool,
}

/// Parses the neighbor table, header line included.
///
/// Rows with fewer than six columns, an unparseable hardware address, or the
/// all-zero / broadcast address are dropped. A device is reachable only when
/// the flags column is exactly `0x2`; flags that are not hexadecimal keep the
/// row but mark it unreachable. When a hardware address appears more than once
/// the last row wins, at the position of the first occurrence.
pub fn parse_neighbors(output: &str) -> Vec<NeighborRecord> {
    let mut records: Vec<NeighborRecord> = Vec::new();
    let mut positions: HashMap<MacAddr, usize> = HashMap::new();

    for line in output.lines().skip(1) {
        let Some(record) = parse_row(line) else {
            continue;
        };
        match positions.get(&record.mac) {
            Some(&idx) => records[idx] = record,
            None => {
                positions.insert(record.mac, records.len());
                records.push(record);
            }
        }
    }

    records
}

fn parse_row(line: &str) -> Option<NeighborRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < MIN_COLUMNS {
        trace!("Skipping short neighbor row: {:?}", line);
        return None;
    }

    let (ip, flags, hw_addr, interface) = (columns[0], columns[2], columns[3], columns[5]);

    let mac = match hw_addr.parse::<MacAddr>() {
        Ok(mac) if !mac.is_sentinel() => mac,
        _ => {
            trace!("Skipping neighbor row without usable hardware address: {:?}", line);
            return None;
        }
    };

    Some(NeighborRecord {
        mac,
        ip: ip.to_string(),
        interface: interface.to_string(),
        reachable: parse_flags(flags) == Some(FLAG_COMPLETE),
    })
}

fn parse_flags(raw: &str) -> Option<u32> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "IP address       HW type     Flags       HW address            Mask     Device\n";

    fn table(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    #[test]
    fn parses_complete_row() {
        let records = parse_neighbors(&table(&[
            "192.168.1.100    0x1         0x2         aa:bb:cc:dd:ee:01     *        br-lan",
        ]));

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.mac.to_string(), "AA:BB:CC:DD:EE:01");
        assert_eq!(rec.ip, "192.168.1.100");
        assert_eq!(rec.interface, "br-lan");
        assert!(rec.reachable);
    }

    #[test]
    fn header_only_and_empty_inputs_yield_nothing() {
        assert!(parse_neighbors("").is_empty());
        assert!(parse_neighbors(HEADER).is_empty());
    }

    #[test]
    fn header_is_skipped_even_if_it_looks_like_a_row() {
        let records = parse_neighbors(
            "10.0.0.1 0x1 0x2 aa:bb:cc:dd:ee:02 * br-lan\n10.0.0.2 0x1 0x2 aa:bb:cc:dd:ee:03 * br-lan\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip, "10.0.0.2");
    }

    #[test]
    fn sentinel_addresses_are_dropped_in_any_case() {
        let records = parse_neighbors(&table(&[
            "192.168.1.2  0x1  0x0  00:00:00:00:00:00  *  br-lan",
            "192.168.1.3  0x1  0x2  ff:ff:ff:ff:ff:ff  *  br-lan",
            "192.168.1.4  0x1  0x2  FF:FF:FF:FF:FF:FF  *  br-lan",
            "192.168.1.5  0x1  0x2  Ff:fF:ff:FF:ff:Ff  *  br-lan",
            "192.168.1.6  0x1  0x2  aa:bb:cc:dd:ee:06  *  br-lan",
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip, "192.168.1.6");
    }

    #[test]
    fn reachability_requires_exactly_complete_flag() {
        let records = parse_neighbors(&table(&[
            "10.0.0.1  0x1  0x2  aa:bb:cc:dd:ee:01  *  br-lan",
            "10.0.0.2  0x1  0x0  aa:bb:cc:dd:ee:02  *  br-lan",
            "10.0.0.3  0x1  0x4  aa:bb:cc:dd:ee:03  *  br-lan",
            "10.0.0.4  0x1  0x6  aa:bb:cc:dd:ee:04  *  br-lan",
            "10.0.0.5  0x1  2    aa:bb:cc:dd:ee:05  *  br-lan",
        ]));
        let reachable: Vec<bool> = records.iter().map(|r| r.reachable).collect();
        assert_eq!(reachable, vec![true, false, false, false, true]);
    }

    #[test]
    fn garbage_flags_keep_row_as_unreachable() {
        let records = parse_neighbors(&table(&[
            "10.0.0.9  0x1  zz  aa:bb:cc:dd:ee:09  *  wlan0",
        ]));
        assert_eq!(records.len(), 1);
        assert!(!records[0].reachable);
        assert_eq!(records[0].interface, "wlan0");
    }

    #[test]
    fn short_and_blank_rows_are_skipped() {
        let records = parse_neighbors(&table(&[
            "",
            "   ",
            "10.0.0.1  0x1  0x2  aa:bb:cc:dd:ee:01  *",
            "10.0.0.2  0x1  0x2  aa:bb:cc:dd:ee:02  *  br-lan",
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip, "10.0.0.2");
    }

    #[test]
    fn malformed_hardware_address_is_skipped() {
        let records = parse_neighbors(&table(&[
            "10.0.0.1  0x1  0x0  <incomplete>  *  br-lan",
            "10.0.0.2  0x1  0x2  aa:bb:cc:dd:ee  *  br-lan",
        ]));
        assert!(records.is_empty());
    }

    #[test]
    fn duplicate_mac_keeps_last_row_once() {
        let records = parse_neighbors(&table(&[
            "10.0.0.1  0x1  0x0  aa:bb:cc:dd:ee:01  *  br-lan",
            "10.0.0.2  0x1  0x2  bb:bb:cc:dd:ee:02  *  br-lan",
            "10.0.0.3  0x1  0x2  AA:BB:CC:DD:EE:01  *  wlan0",
        ]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mac.to_string(), "AA:BB:CC:DD:EE:01");
        assert_eq!(records[0].ip, "10.0.0.3");
        assert_eq!(records[0].interface, "wlan0");
        assert!(records[0].reachable);
        assert_eq!(records[1].ip, "10.0.0.2");
    }

    #[test]
    fn output_preserves_input_order() {
        let records = parse_neighbors(&table(&[
            "10.0.0.30  0x1  0x2  aa:bb:cc:dd:ee:30  *  br-lan",
            "10.0.0.4   0x1  0x2  aa:bb:cc:dd:ee:04  *  br-lan",
            "10.0.0.200 0x1  0x2  aa:bb:cc:dd:ee:c8  *  br-lan",
        ]));
        let ips: Vec<&str> = records.iter().map(|r| r.ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.30", "10.0.0.4", "10.0.0.200"]);
    }

    #[test]
    fn flags_parse_with_or_without_prefix() {
        assert_eq!(parse_flags("0x2"), Some(2));
        assert_eq!(parse_flags("0X6"), Some(6));
        assert_eq!(parse_flags("a"), Some(10));
        assert_eq!(parse_flags("0x"), None);
        assert_eq!(parse_flags("zz"), None);
    }
}
