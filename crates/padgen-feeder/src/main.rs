mod cli;
mod logging;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use colored::{ColoredString, Colorize};
use crossbeam_channel::{select, tick, unbounded};

use padgen::{ranged_id, AxisUsage, Backend, DeviceHub, DeviceStatus};
use padgen_driver::loopback::{LoopbackJoystick, LoopbackPadBus, LoopbackSlotBus};

use crate::cli::{Cli, Command};

fn build_hub() -> DeviceHub {
    // The feeder runs against the loopback drivers, so every flow can be
    // exercised on a machine without any of the real buses installed.
    DeviceHub::new(
        Box::new(LoopbackJoystick::new()),
        Box::new(LoopbackSlotBus::new()),
        Box::new(LoopbackPadBus::new()),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup(cli.verbose, cli.no_color);

    let mut hub = build_hub();
    let result = match cli.command {
        Command::Status => {
            run_status(&mut hub);
            Ok(())
        }
        Command::Plug { backend, index } => run_plug(&mut hub, backend.backend(), index),
        Command::Feed { backend, index, seconds } => {
            run_feed(&mut hub, backend.backend(), index, seconds)
        }
    };
    hub.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn status_label(status: DeviceStatus) -> ColoredString {
    match status {
        DeviceStatus::Own => "own".green(),
        DeviceStatus::Free => "free".normal(),
        DeviceStatus::Busy => "busy".yellow(),
        DeviceStatus::Miss => "miss".dimmed(),
        DeviceStatus::Unknown => "unknown".red(),
    }
}

fn run_status(hub: &mut DeviceHub) {
    let bands = [
        (Backend::LegacyJoystick, "joystick"),
        (Backend::LegacyBus, "bus"),
        (Backend::GenericXbox, "xbox"),
        (Backend::GenericDs4, "ds4"),
    ];
    for (backend, name) in bands {
        for index in 1..=backend.max_index() {
            let status = hub.status_of(backend, index);
            log::info!(
                "{:>5}  {name}#{index:<2} {}",
                ranged_id(backend, index),
                status_label(status)
            );
        }
    }
}

fn run_plug(hub: &mut DeviceHub, backend: Backend, index: u8) -> padgen::Result<()> {
    let handle = hub.acquire(backend, index)?;
    let info = hub.device_info(handle)?;
    log::info!(
        "attached {backend:?} #{index} (vid {:04X}, pid {:04X}, serial {})",
        info.vendor_id,
        info.product_id,
        info.serial
    );
    if let Ok(number) = hub.player_number(handle) {
        log::info!("assigned player number {number}");
    }
    hub.relinquish(handle)?;
    log::info!("released {backend:?} #{index}");
    Ok(())
}

fn run_feed(hub: &mut DeviceHub, backend: Backend, index: u8, seconds: u64) -> padgen::Result<()> {
    let handle = hub.acquire(backend, index)?;
    log::info!("feeding {backend:?} #{index} for {seconds}s, Ctrl+C to stop early");

    let (stop_tx, stop_rx) = unbounded::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .expect("failed to set Ctrl+C handler");

    let ticker = tick(Duration::from_millis(20));
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut phase = 0.0_f32;
    let mut button_down = false;

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                if Instant::now() >= deadline {
                    break;
                }
                phase += 0.05;
                let swing = phase.sin() * 50.0 + 50.0;
                hub.set_axis_pct(handle, AxisUsage::LEFT_X, swing)?;
                hub.set_axis_pct(handle, AxisUsage::LEFT_Y, 100.0 - swing)?;
                hub.set_axis_pct(handle, AxisUsage::RIGHT_TRIGGER, swing)?;
                hub.set_pov_deg(handle, 1, phase.to_degrees() % 360.0)?;
                let want_down = (phase as u32) % 2 == 0;
                if want_down != button_down {
                    hub.set_button(handle, 1, want_down)?;
                    button_down = want_down;
                }
            }
        }
    }

    hub.reset(handle)?;
    hub.relinquish(handle)?;
    log::info!("released {backend:?} #{index}");
    Ok(())
}
