// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Power-loss injection against the full store.
//!
//! Every program and erase is a possible reset point. After each cut the
//! flash image is rebooted into a fresh `Eeprom`, `init` runs, and the store
//! must be back in the steady state with every key at a value it really held.

use flashvar::config::{Layout, PAGE_SIZE};
use flashvar::flash::SimFlash;
use flashvar::{DeviceError, Eeprom, EepromError, KeyTable, Page, PageStatus};

const KEYS: u16 = 8;
const POWER_LOSS: EepromError = EepromError::Device(DeviceError::PowerLoss);

fn table() -> KeyTable {
    KeyTable::sequential(1, KEYS).unwrap()
}

fn boot(image: &[u8]) -> Eeprom<SimFlash> {
    let layout = Layout::default();
    let flash = SimFlash::from_image(layout.base_address, image.to_vec(), PAGE_SIZE);
    Eeprom::new(flash, layout, table())
}

fn blank() -> Eeprom<SimFlash> {
    let mut eeprom = boot(&vec![0xFF; 2 * PAGE_SIZE as usize]);
    eeprom.init().unwrap();
    eeprom
}

fn snapshot(eeprom: &Eeprom<SimFlash>) -> Vec<u8> {
    eeprom.device().image().to_vec()
}

/// Printable payload; every word has a non-zero second byte, so a torn
/// payload never reads back as a trailer. Binary payloads carry no such
/// guarantee, see `test_torn_binary_payload_can_end_the_log`.
fn payload(key: u16, generation: u32, len: usize) -> Vec<u8> {
    format!("key-{key:04X}-gen-{generation:07}")
        .into_bytes()
        .into_iter()
        .cycle()
        .take(len)
        .collect()
}

fn current(eeprom: &mut Eeprom<SimFlash>, key: u16) -> Option<Vec<u8>> {
    match eeprom.read_variable(key, 64) {
        Ok(value) => Some(value),
        Err(EepromError::NotFound(_)) => None,
        Err(e) => panic!("key {key}: {e}"),
    }
}

/// Page0 VALID holding 42 records of 20 bytes, 8 bytes short of full.
/// Returns the image and the latest value per key.
fn nearly_full() -> (Vec<u8>, Vec<Vec<u8>>) {
    let mut eeprom = blank();
    let mut latest = vec![Vec::new(); KEYS as usize];
    for generation in 0..42u32 {
        let key = 1 + (generation % KEYS as u32) as u16;
        let value = payload(key, generation, 20);
        eeprom.write_variable(key, &value).unwrap();
        latest[key as usize - 1] = value;
    }
    assert_eq!(eeprom.free_bytes().unwrap(), 8);
    (snapshot(&eeprom), latest)
}

fn assert_steady(eeprom: &mut Eeprom<SimFlash>) {
    let states = eeprom.page_states().unwrap();
    assert!(
        matches!(
            states,
            [PageStatus::Valid, PageStatus::Erased] | [PageStatus::Erased, PageStatus::Valid]
        ),
        "not steady: {states:?}"
    );

    let idle = eeprom.active_page().unwrap().other();
    let start = idle.index() as usize * PAGE_SIZE as usize;
    let image = snapshot(eeprom);
    assert!(image[start..start + PAGE_SIZE as usize].iter().all(|&b| b == 0xFF));

    // A second init over the steady state changes nothing.
    eeprom.init().unwrap();
    assert_eq!(snapshot(eeprom), image);
}

/// Steady state, `key` holds `old` or `new`, every other key holds `latest`.
fn assert_recovered(eeprom: &mut Eeprom<SimFlash>, latest: &[Vec<u8>], key: u16, new: &[u8]) {
    assert_steady(eeprom);
    for k in 1..=KEYS {
        let value = current(eeprom, k).expect("value lost");
        if k == key {
            assert!(
                value == latest[k as usize - 1] || value == new,
                "key {k} holds neither old nor new value"
            );
        } else {
            assert_eq!(value, latest[k as usize - 1], "key {k} changed");
        }
    }
}

#[test]
fn test_power_cut_at_every_step_of_compaction() {
    let (image, latest) = nearly_full();
    let key = 3;
    let new = payload(key, 9_999, 20);

    let mut completed_at = None;
    for cut in 0..200 {
        let mut eeprom = boot(&image);
        eeprom.device_mut().cut_power_after(cut);
        match eeprom.write_variable(key, &new) {
            Ok(()) => {
                completed_at = Some(cut);
                assert_eq!(eeprom.active_page().unwrap(), Page::Page1);
                break;
            }
            Err(e) => assert_eq!(e, POWER_LOSS, "cut {cut}"),
        }

        let mut rebooted = boot(&snapshot(&eeprom));
        rebooted.init().unwrap();
        assert_recovered(&mut rebooted, &latest, key, &new);
    }

    // Receiving mark, incoming record, seven copies of six words, erase, valid mark.
    assert_eq!(completed_at, Some(1 + 6 + 7 * 6 + 1 + 1));
}

#[test]
fn test_power_cut_during_recovery_resumes() {
    let (image, latest) = nearly_full();
    let key = 6;
    let new = payload(key, 9_999, 20);

    for cut in 0..51 {
        let mut eeprom = boot(&image);
        eeprom.device_mut().cut_power_after(cut);
        assert_eq!(eeprom.write_variable(key, &new), Err(POWER_LOSS));
        let crashed = snapshot(&eeprom);

        let mut recovered = false;
        for second in 0..200 {
            let mut eeprom = boot(&crashed);
            eeprom.device_mut().cut_power_after(second);
            match eeprom.init() {
                Ok(()) => {
                    eeprom.device_mut().restore_power();
                    assert_recovered(&mut eeprom, &latest, key, &new);
                    recovered = true;
                    break;
                }
                Err(e) => assert_eq!(e, POWER_LOSS, "cut {cut}/{second}"),
            }

            let mut rebooted = boot(&snapshot(&eeprom));
            rebooted.init().unwrap();
            assert_recovered(&mut rebooted, &latest, key, &new);
        }
        assert!(recovered, "init after cut {cut} never completed");
    }
}

#[test]
fn test_power_cut_during_plain_append() {
    let mut eeprom = blank();
    let mut latest = Vec::new();
    for key in 1..=KEYS {
        let value = payload(key, 0, 20);
        eeprom.write_variable(key, &value).unwrap();
        latest.push(value);
    }
    let image = snapshot(&eeprom);
    let key = 5;
    let new = payload(key, 1, 20);

    for cut in 0..6 {
        let mut eeprom = boot(&image);
        eeprom.device_mut().cut_power_after(cut);
        assert_eq!(eeprom.write_variable(key, &new), Err(POWER_LOSS));

        let mut rebooted = boot(&snapshot(&eeprom));
        rebooted.init().unwrap();
        // Anything short of the trailer leaves the old value in place.
        assert_eq!(current(&mut rebooted, key).unwrap(), latest[key as usize - 1]);
        assert_recovered(&mut rebooted, &latest, key, &new);

        // The torn words are skipped and the log keeps working.
        rebooted.write_variable(key, &new).unwrap();
        assert_eq!(current(&mut rebooted, key).unwrap(), new);
    }
}

/// The format has no checksum. A torn binary payload whose last word decodes
/// as a reserved-key trailer ends every later scan at that word, hiding all
/// older records. Pinned here so a format change has to update it knowingly.
#[test]
fn test_torn_binary_payload_can_end_the_log() {
    let mut eeprom = blank();
    eeprom.write_variable(1, &payload(1, 0, 20)).unwrap();
    eeprom.write_variable(2, &payload(2, 0, 20)).unwrap();

    // Second word is 0xFFFF_0005: key 0xFFFF, length 5.
    let binary = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x00, 0xFF, 0xFF];
    eeprom.device_mut().cut_power_after(2);
    assert_eq!(eeprom.write_variable(1, &binary), Err(POWER_LOSS));

    let mut eeprom = boot(&snapshot(&eeprom));
    eeprom.init().unwrap();
    assert_steady(&mut eeprom);
    assert_eq!(current(&mut eeprom, 1), None);
    assert_eq!(current(&mut eeprom, 2), None);

    // Records written above the torn word are found again.
    eeprom.write_variable(3, b"after").unwrap();
    assert_eq!(current(&mut eeprom, 3).as_deref(), Some(&b"after"[..]));
    assert_eq!(current(&mut eeprom, 2), None);
}

struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }
}

#[test]
fn test_random_writes_with_random_power_cuts() {
    let mut rng = Lcg(0x5EED_F1A5);
    let mut model: Vec<Option<Vec<u8>>> = vec![None; KEYS as usize];
    let mut eeprom = blank();
    let mut active = eeprom.active_page().unwrap();
    let mut crashes = 0;
    let mut page_switches = 0;

    for step in 0..600u32 {
        let key = 1 + (rng.next_u32() % KEYS as u32) as u16;
        let len = 4 * (1 + rng.next_u32() % 16) as usize;
        let data = payload(key, step, len);
        let slot = key as usize - 1;

        if rng.next_u32() % 4 == 0 {
            let budget = (rng.next_u32() % 40) as usize;
            eeprom.device_mut().cut_power_after(budget);
        }

        match eeprom.write_variable(key, &data) {
            Ok(()) => {
                eeprom.device_mut().restore_power();
                model[slot] = Some(data);
            }
            Err(e) if e == POWER_LOSS => {
                crashes += 1;
                eeprom = boot(&snapshot(&eeprom));
                eeprom.init().unwrap();
                assert_steady(&mut eeprom);

                let got = current(&mut eeprom, key);
                assert!(
                    got == model[slot] || got.as_deref() == Some(&data[..]),
                    "step {step}: key {key} holds an unknown value"
                );
                model[slot] = got;
            }
            Err(e) => panic!("step {step}: {e}"),
        }

        for (i, expected) in model.iter().enumerate() {
            let k = i as u16 + 1;
            assert_eq!(&current(&mut eeprom, k), expected, "step {step}: key {k}");
        }

        let now = eeprom.active_page().unwrap();
        if now != active {
            page_switches += 1;
            active = now;
        }
    }

    assert!(crashes > 0);
    assert!(page_switches > 5, "only {page_switches} page transfers");
}
