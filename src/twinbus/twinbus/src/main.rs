extern crate clap;
use crossbeam_channel::bounded; // Inter-thread communication
use log::{debug, error, info};

use twinbus_core::memory::BiosImage;
use twinbus_core::{Peripherals, System};
use twinbus_peripherals::diagnostics::ChannelDiagnostics;
use twinbus_peripherals::{IopIntc, LatchBank, Spu2};

// IOP clock in cycles per microsecond (36.864 MHz)
const IOP_CYCLES_PER_MICRO: f64 = 36.864;

/// Configures command-line interface using clap
fn get_cli_config<'a>() -> clap::ArgMatches<'a> {
    let description = "EE/IOP memory bus, IOP DMA and SIF bridge driver";
    clap::App::new("twinbus")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("bios")
                .long("bios")
                .value_name("FILE")
                .help("Boot ROM image (at most 4 MiB)")
                .takes_value(true)
                .required(true),
        )
        .arg(
            clap::Arg::with_name("quanta")
                .long("quanta")
                .value_name("N")
                .help("Stop after N scheduling quanta")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("quantum-cycles")
                .long("quantum-cycles")
                .value_name("N")
                .help("IOP cycles per DMA quantum")
                .takes_value(true)
                .default_value("32"),
        )
        .get_matches()
}

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>, String> {
    match matches.value_of(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid value for --{}: {}", name, raw)),
        None => Ok(None),
    }
}

/// Converts elapsed IOP cycles into whole DMA quanta, carrying the remainder
struct QuantumBudget {
    quantum: u64,
    pending: u64,
}

impl QuantumBudget {
    fn new(quantum: u32) -> Self {
        QuantumBudget {
            quantum: quantum as u64,
            pending: 0,
        }
    }

    /// Adds `cycles` and returns how many full quanta are now due
    fn credit(&mut self, cycles: u64) -> u64 {
        self.pending += cycles;
        let quanta = self.pending / self.quantum;
        self.pending %= self.quantum;
        quanta
    }
}

fn main() {
    env_logger::init();

    // Set up Ctrl-C handler with channel communication
    let (signal_sender, signal_receiver) = bounded(1);
    let handler_result = ctrlc::set_handler(move || {
        if signal_sender.is_full() {
            std::process::exit(-1); // Emergency exit if channel blocked
        }
        let _send_result = signal_sender.send(());
    });

    if let Err(e) = handler_result {
        error!("Signal handler failed: {:?}", e);
        return;
    }

    let cli_matches = get_cli_config();

    let (quanta_limit, quantum_cycles) = match (
        parse_arg::<u64>(&cli_matches, "quanta"),
        parse_arg::<u32>(&cli_matches, "quantum-cycles"),
    ) {
        (Ok(limit), Ok(Some(cycles))) if cycles > 0 => (limit, cycles),
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            return;
        }
        _ => {
            error!("--quantum-cycles must be a positive number");
            return;
        }
    };

    // Load boot ROM image
    let bios = match cli_matches.value_of("bios").map(std::fs::read) {
        Some(Ok(bytes)) => match BiosImage::from_bytes(&bytes) {
            Ok(image) => image,
            Err(e) => {
                error!("{}", e);
                return;
            }
        },
        Some(Err(e)) => {
            error!("Unable to read boot ROM: {}", e);
            return;
        }
        None => {
            error!("No boot ROM specified");
            return;
        }
    };

    // Initialize hardware components
    let mut ee_timers = LatchBank::new("EeTimers");
    let mut ee_dmac = LatchBank::new("EeDmac");
    let mut ee_intc = LatchBank::new("EeIntc");
    let mut gs = LatchBank::new("Gs");
    let mut ipu = LatchBank::new("Ipu");
    let mut gif = LatchBank::new("Gif");
    let mut vif0 = LatchBank::new("Vif0");
    let mut vif1 = LatchBank::new("Vif1");
    let mut iop_timers = LatchBank::new("IopTimers");
    let mut spu = LatchBank::new("Spu");
    let mut iop_intc = IopIntc::new();
    let mut spu2 = Spu2::new();
    let mut diagnostics = ChannelDiagnostics::new();

    let peripherals = Peripherals {
        ee_timers: &mut ee_timers,
        ee_dmac: &mut ee_dmac,
        ee_intc: &mut ee_intc,
        gs: &mut gs,
        ipu: &mut ipu,
        gif: &mut gif,
        vif0: &mut vif0,
        vif1: &mut vif1,
        iop_timers: &mut iop_timers,
        iop_intc: &mut iop_intc,
        spu: &mut spu,
        spu2: &mut spu2,
        diagnostics: &mut diagnostics,
    };

    let mut system = match System::new(&bios, peripherals) {
        Ok(system) => system,
        Err(e) => {
            error!("Unable to assemble memory map: {}", e);
            return;
        }
    };
    system.reset();
    debug!("Reset vector word: {:08x}", system.ee_read_word(0xBFC0_0000));

    // Main scheduling loop
    let mut executed_quanta: u64 = 0;
    let mut budget = QuantumBudget::new(quantum_cycles);
    let mut cycle_timer = std::time::Instant::now();
    'schedule: loop {
        if !signal_receiver.is_empty() {
            break;
        }

        let elapsed_time = cycle_timer.elapsed();
        if elapsed_time.as_millis() == 0 {
            // Prevent busy-waiting
            std::thread::sleep(std::time::Duration::from_micros(5000));
            continue;
        }

        // Catch up with real time at the IOP clock rate
        let target_cycles = (elapsed_time.as_micros() as f64 * IOP_CYCLES_PER_MICRO) as u64;
        for _ in 0..budget.credit(target_cycles) {
            system.run(quantum_cycles);
            executed_quanta += 1;

            if quanta_limit.map_or(false, |limit| executed_quanta >= limit) {
                break 'schedule;
            }
        }

        cycle_timer = std::time::Instant::now();
    }

    system.flush_console();
    info!(
        "Ran {} quanta ({} IOP cycles)",
        executed_quanta,
        system.iop_dmac().cycles()
    );
    drop(system);

    let summary = diagnostics.finish();
    if !summary.is_empty() {
        info!(
            "{} unhandled accesses at {} distinct locations",
            summary.total(),
            summary.entries.len()
        );
        for (access, count) in &summary.entries {
            info!("  {} (x{})", access, count);
        }
    }
    debug!(
        "SPU2 DMA completions: core0 {}, core1 {}",
        spu2.completions(0),
        spu2.completions(1)
    );
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn test_budget_carries_partial_quanta() {
        let mut budget = QuantumBudget::new(32);
        assert_eq!(budget.credit(31), 0);
        assert_eq!(budget.credit(1), 1);
        assert_eq!(budget.credit(70), 2);
        assert_eq!(budget.credit(26), 1);
        assert_eq!(budget.pending, 0);
    }
}
