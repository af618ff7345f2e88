//! Audio Network Analyzer Firmware
//!
//! Entry point for the STM32G474 build. Loads the persisted parameter
//! record, builds the analyzer window and pipeline, then runs the audio
//! quantum on a ticker and the serial command dictionary on USART2.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_stm32::flash::Flash;
use embassy_stm32::usart::{self, Uart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use avna_dsp::dsp::spectrum::SpectrumAnalyzer;
use avna_dsp::params::RECORD_LEN;
use avna_dsp::prelude::*;
use avna_dsp::protocol::register_control_commands;

bind_interrupts!(struct Irqs {
    USART2 => usart::InterruptHandler<peripherals::USART2>;
});

/// Last 2 KiB page of the 512 KiB flash
const PARAM_FLASH_OFFSET: u32 = 0x7_F800;

/// Spectra between peak reports
const REPORT_EVERY_WINDOWS: u32 = 40;

type SharedPipeline = Mutex<CriticalSectionRawMutex, RefCell<Option<Pipeline<'static>>>>;

static PIPELINE: SharedPipeline = Mutex::new(RefCell::new(None));
static WINDOW: StaticCell<WindowTable> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("AVNA DSP core v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    let mut raw = [0u8; RECORD_LEN];
    let mut flash = Flash::new_blocking(p.FLASH);
    let record = match flash.blocking_read(PARAM_FLASH_OFFSET, &mut raw) {
        Ok(()) => ParamRecord::decode(&raw).unwrap_or_else(|e| {
            warn!("stored parameters rejected: {}", e);
            ParamRecord::default()
        }),
        Err(_) => {
            warn!("parameter flash unreadable, using defaults");
            ParamRecord::default()
        }
    };
    info!(
        "params: amp={} lpf={} seed={} window={}",
        record.noise_amplitude,
        record.low_pass_hz,
        record.seed,
        record.window
    );

    let window: &'static WindowTable = WINDOW.init(WindowTable::new(record.window));
    let mut pipeline = Pipeline::new(window);
    pipeline.apply_params(&record);
    PIPELINE.lock(|cell| *cell.borrow_mut() = Some(pipeline));

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = 115_200;
    match Uart::new(
        p.USART2,
        p.PA3, // RX
        p.PA2, // TX
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        uart_config,
    ) {
        Ok(uart) => spawner.spawn(command_task(uart)).unwrap(),
        Err(_) => warn!("USART2 config rejected, serial commands disabled"),
    }

    spawner.spawn(audio_task()).unwrap();
    info!("Tasks spawned, quantum {} us", quantum_us());
}

/// Runs one pipeline quantum per audio block period
#[embassy_executor::task]
async fn audio_task() {
    let mut ticker = Ticker::every(Duration::from_micros(u64::from(quantum_us())));
    let mut output = SILENT_BLOCK;
    let mut published = 0u32;

    loop {
        ticker.next().await;

        let report = PIPELINE.lock(|cell| {
            cell.borrow_mut()
                .as_mut()
                .map(|pipeline| (pipeline.tick(None, &mut output), pipeline.analyzer().peak(), pipeline.stats()))
        });

        let Some((report, (bin, power), stats)) = report else {
            continue;
        };
        if report.spectrum_ready {
            published = published.wrapping_add(1);
            if published % REPORT_EVERY_WINDOWS == 0 {
                info!(
                    "peak bin {} ({} Hz) power {} | {}",
                    bin,
                    SpectrumAnalyzer::bin_frequency(bin),
                    power,
                    stats
                );
            }
        }
    }
}

/// Feeds received bytes to the command dictionary and writes responses back
#[embassy_executor::task]
async fn command_task(mut uart: Uart<'static, embassy_stm32::mode::Async>) {
    let mut commands: CommandDictionary<Pipeline<'static>> = CommandDictionary::new();
    if let Err(e) = register_control_commands(&mut commands) {
        warn!("control commands: {}", e);
    }
    commands.set_response_mode(ResponseMode::EchoOk);

    let mut byte = [0u8; 1];
    loop {
        if uart.read(&mut byte).await.is_err() {
            continue;
        }
        PIPELINE.lock(|cell| {
            if let Some(pipeline) = cell.borrow_mut().as_mut() {
                commands.feed(byte[0], pipeline);
            }
        });
        // Blank lines echo under EchoFullCommand without dispatching
        let response = commands.take_response();
        if !response.is_empty() && uart.write(response.as_bytes()).await.is_err() {
            warn!("serial write failed");
        }
    }
}
