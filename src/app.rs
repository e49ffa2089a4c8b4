// Wiring between the command line and the verification suite.

use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::console::Console;
use crate::harness::Harness;
use crate::image::{generate_image, load_image, write_image};
use crate::layout::RomLayout;
use crate::region::{ensure_privileged, BufferRegion, MappedRegion, MemoryRegion};
use crate::suite::{run_suite, SuiteSummary};
use crate::utils::Args;
use crate::{cpu_utils, log_debug_fmt, log_info_fmt, log_success_fmt};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Process exit code for configuration and resource errors, before any test ran.
pub const EXIT_RESOURCE_ERROR: u8 = 2;

/// Writes a new test image to `path`.
pub fn generate(args: &Args, path: &Path) -> Result<(), Box<dyn Error>> {
    let layout = args.layout()?;
    let version = args.expected_version()?;
    let seeds = args.seed_source();
    let seed = seeds.seed();
    log_debug_fmt!("Generating image with seed {:#x}", seed);

    let data = generate_image(
        layout.image_size(),
        version,
        &mut StdRng::seed_from_u64(seed),
    );
    write_image(path, &data)?;
    log_success_fmt!(
        "Wrote {} byte test image with version '{}' to {}",
        data.len(),
        version,
        path.display()
    );
    Ok(())
}

/// Opens the device side: a dump file if one was given, the live ROM window otherwise.
pub fn open_device(args: &Args, layout: &RomLayout) -> Result<Box<dyn MemoryRegion>, Box<dyn Error>> {
    match &args.device_file {
        Some(path) => {
            let data = load_image(path, layout.image_size())?;
            log_info_fmt!("Verifying dump {} instead of the ROM window", path.display());
            Ok(Box::new(BufferRegion::new(data, layout.hardware_base())))
        }
        None => {
            ensure_privileged()?;
            let region = MappedRegion::map(&args.device_path, layout.hardware_base(), layout.image_size())?;
            log_info_fmt!("ROM memory address: {:#08x}", region.base_address());
            Ok(Box::new(region))
        }
    }
}

/// Loads everything, runs the selected tests and returns what they found.
///
/// Errors are resource or configuration problems; no test has run when one
/// is returned. Test failures are part of the summary, not errors.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<SuiteSummary, Box<dyn Error>> {
    let layout = args.layout()?;
    let config = args.suite_config()?;

    let mut console = Console::new(out);
    let reference = load_image(&args.image, layout.image_size())?;
    console.line(&format!("- {} loaded", args.image.display()));
    console.line(&format!("- {} size: {} bytes", args.image.display(), reference.len()));
    let reference = BufferRegion::new(reference, layout.hardware_base());

    let device = open_device(args, &layout)?;
    cpu_utils::apply_core_request(args.core)?;

    let mut harness = Harness::new(
        device.as_ref(),
        &reference,
        layout,
        args.seed_source(),
        console,
    );
    Ok(run_suite(&mut harness, &config))
}
