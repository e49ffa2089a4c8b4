#![allow(dead_code)]

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use romtester::console::Console;
use romtester::harness::Harness;
use romtester::image::generate_image;
use romtester::layout::RomLayout;
use romtester::pattern::SeedSource;
use romtester::region::BufferRegion;
use romtester::utils::BUILD_VERSION;

/// A device/reference pair built from the same generated image.
pub struct RomFixture {
    pub layout: RomLayout,
    pub device: BufferRegion,
    pub reference: BufferRegion,
}

impl RomFixture {
    pub fn generated(seed: u64) -> RomFixture {
        let layout = RomLayout::default();
        let data = generate_image(layout.image_size(), BUILD_VERSION, &mut StdRng::seed_from_u64(seed));
        RomFixture {
            layout,
            device: BufferRegion::new(data.clone(), layout.hardware_base()),
            reference: BufferRegion::new(data, layout.hardware_base()),
        }
    }

    pub fn zeroed() -> RomFixture {
        let layout = RomLayout::default();
        RomFixture {
            layout,
            device: BufferRegion::new(vec![0; layout.image_size()], layout.hardware_base()),
            reference: BufferRegion::new(vec![0; layout.image_size()], layout.hardware_base()),
        }
    }

    /// Corrupts one device byte, leaving the reference intact.
    pub fn flip_device_byte(&mut self, offset: usize, mask: u8) {
        self.device.as_mut_slice()[offset] ^= mask;
    }

    pub fn harness(&self, seeds: SeedSource) -> Harness<'_, Vec<u8>> {
        Harness::new(
            &self.device,
            &self.reference,
            self.layout,
            seeds,
            Console::new(Vec::new()),
        )
    }
}

pub fn output(harness: Harness<'_, Vec<u8>>) -> String {
    String::from_utf8(harness.into_console().into_inner()).unwrap()
}

/// Unique scratch file path for this test process.
pub fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("romtester-it-{}-{}", std::process::id(), name))
}
