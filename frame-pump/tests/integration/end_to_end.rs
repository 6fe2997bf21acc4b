//! The built-in raw codec from a raw byte stream to an IVF file in memory.

use std::io::Cursor;

use frame_pump::{
    Codec, EncodeDriver, EncodeSettings, EncoderAdapter, ImageFormat, IvfHeader, IvfWriter,
    PacketSink, RawFileSource, RawFrame,
};

use crate::helpers::init_test_tracing;

/// `count` frames where every byte of frame `i` is `i`.
fn raw_input(format: ImageFormat, width: u32, height: u32, count: usize) -> Vec<u8> {
    let frame_size = format.frame_size(width, height);
    (0..count)
        .flat_map(|i| std::iter::repeat(i as u8).take(frame_size))
        .collect()
}

struct IvfRecord {
    pts: i64,
    payload: Vec<u8>,
}

fn parse_ivf(bytes: &[u8]) -> (u32, Vec<IvfRecord>) {
    assert_eq!(&bytes[0..4], b"DKIF");
    let frame_count = u32::from_le_bytes(bytes[24..28].try_into().unwrap());

    let mut records = Vec::new();
    let mut rest = &bytes[32..];
    while !rest.is_empty() {
        let size = u32::from_le_bytes(rest[0..4].try_into().unwrap()) as usize;
        let pts = i64::from_le_bytes(rest[4..12].try_into().unwrap());
        records.push(IvfRecord {
            pts,
            payload: rest[12..12 + size].to_vec(),
        });
        rest = &rest[12 + size..];
    }
    (frame_count, records)
}

fn encode_to_ivf(settings: &EncodeSettings, input: Vec<u8>) -> (u64, Vec<u8>) {
    settings.validate().unwrap();
    let codec = settings.codec().unwrap();
    let params = settings.encode_parameters().unwrap();

    let frame = RawFrame::new(params.format(), params.width(), params.height(), 32).unwrap();
    let mut source = RawFileSource::new(Cursor::new(input), frame);

    let header = IvfHeader {
        fourcc: codec.fourcc(params.format()),
        width: params.width() as u16,
        height: params.height() as u16,
        time_base: params.time_base(),
        frame_count: 0,
    };
    let mut sink = IvfWriter::new(Cursor::new(Vec::new()), header).unwrap();

    let driver = EncodeDriver::new(codec.open(), &params, settings.driver_config()).unwrap();
    let summary = driver.run(&mut source, &mut sink).unwrap();
    sink.finish().unwrap();

    assert_eq!(source.frames_read(), summary.frames_submitted);
    (summary.frames_submitted, sink.into_inner().into_inner())
}

#[test]
fn raw_codec_round_trips_frames_through_ivf() {
    init_test_tracing();

    let settings = EncodeSettings {
        width: 16,
        height: 8,
        keyframe_interval: 2,
        lag_in_frames: 2,
        ..Default::default()
    };
    let input = raw_input(ImageFormat::I420, 16, 8, 5);
    let (frames, ivf) = encode_to_ivf(&settings, input);
    assert_eq!(frames, 5);

    assert_eq!(&ivf[8..12], b"I420");
    let (frame_count, records) = parse_ivf(&ivf);
    assert_eq!(frame_count, 5);
    assert_eq!(records.iter().map(|r| r.pts).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.payload.len(), ImageFormat::I420.frame_size(16, 8));
        assert!(record.payload.iter().all(|&b| b == i as u8));
    }
}

#[test]
fn frame_cap_limits_ivf_output() {
    let settings = EncodeSettings {
        width: 16,
        height: 8,
        max_frames: 3,
        ..Default::default()
    };
    let (frames, ivf) = encode_to_ivf(&settings, raw_input(ImageFormat::I420, 16, 8, 8));
    assert_eq!(frames, 3);

    let (frame_count, records) = parse_ivf(&ivf);
    assert_eq!(frame_count, 3);
    assert_eq!(records.len(), 3);
}

#[test]
fn high_bit_depth_input() {
    let settings = EncodeSettings {
        width: 8,
        height: 4,
        bit_depth: 16,
        ..Default::default()
    };
    let (frames, ivf) = encode_to_ivf(&settings, raw_input(ImageFormat::I42016, 8, 4, 2));
    assert_eq!(frames, 2);

    assert_eq!(ivf[8..12], ImageFormat::I42016.fourcc());
    let (_, records) = parse_ivf(&ivf);
    assert_eq!(records[1].payload.len(), 8 * 4 * 3);
}

#[test]
fn odd_width_is_rejected_up_front() {
    let settings = EncodeSettings {
        width: 417,
        ..Default::default()
    };
    let err = settings.validate().unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "Invalid frame size: 417x240");
    assert!(settings.encode_parameters().is_err());
    assert!(RawFrame::new(ImageFormat::I420, 417, 240, 32).is_err());
}

#[test]
fn boxed_codec_reports_its_name() {
    let codec = Codec::require("raw").unwrap();
    let adapter = codec.open();
    assert_eq!(adapter.name(), "raw");
}
