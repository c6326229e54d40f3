use std::fs::{self, File};

use tapelink::punch::transmit;
use tapelink::serial::SimulatedDevice;

#[test]
fn test_punch_file_to_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.tape");
    let data: Vec<u8> = b"\0\0\0HELLO\0\0\0".to_vec();
    fs::write(&path, &data).unwrap();

    let mut device = SimulatedDevice::new(Vec::new());
    let summary = transmit(File::open(&path).unwrap(), &mut device).unwrap();

    assert_eq!(summary.bytes_sent, data.len() as u64);
    assert_eq!(device.sent(), &data[..]);
}
