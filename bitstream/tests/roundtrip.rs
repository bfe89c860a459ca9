use bitstream::{Reader, Writer};

#[test]
fn message_roundtrip_mixed() {
    let mut writer = Writer::new();
    writer.write_u8(0x00);
    writer.write_varu32(1234);
    writer.write_vars32(-77);
    writer.write_f32(-0.25);
    writer.write_angle(-1.0);
    writer.write_string_nt("name");
    writer.write_string("suffix");
    let bytes = writer.finish();

    let mut reader = Reader::new(&bytes);
    assert_eq!(reader.read_u8().unwrap(), 0x00);
    assert_eq!(reader.read_varu32().unwrap(), 1234);
    assert_eq!(reader.read_vars32().unwrap(), -77);
    assert_eq!(reader.read_f32().unwrap(), -0.25);
    assert_eq!(reader.read_angle().unwrap(), -1.0);
    assert_eq!(reader.read_string_nt().unwrap(), "name");
    assert_eq!(reader.read_string().unwrap(), "suffix");
    assert!(reader.is_empty());
}

#[test]
fn independent_writers_do_not_interleave() {
    let mut first = Writer::new();
    let mut second = Writer::new();
    first.write_u8(1);
    second.write_u8(2);
    first.write_u8(3);
    second.write_u8(4);
    assert_eq!(first.finish(), vec![1, 3]);
    assert_eq!(second.finish(), vec![2, 4]);
}
