#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use lbs_firmware::advertising::{AdvertisingController, AdvertisingParams};
use lbs_firmware::app;
use lbs_firmware::board::{BleController, EspPlatform, SharedLeds, StatusLeds, UserButton};
use lbs_firmware::config::ble;
use lbs_firmware::gatt::{AppCallbacks, LBS_SERVICE_UUID};
use lbs_firmware::tasks::{self, Advertising, AppService};

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Board LEDs, shared by the BLE and blink tasks
static LEDS: StaticCell<SharedLeds> = StaticCell::new();

/// Advertising controller, scheduled from boot and the lifecycle
static ADVERTISING: StaticCell<Advertising> = StaticCell::new();

/// User button level
static APP_BUTTON: UserButton = UserButton::new();

#[esp_hal::main]
fn main() -> ! {
    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // LEDs are active low, start with all of them off
    let run_led = Output::new(peripherals.GPIO48, Level::High, OutputConfig::default());
    let con_led = Output::new(peripherals.GPIO47, Level::High, OutputConfig::default());
    let user_led = Output::new(peripherals.GPIO21, Level::High, OutputConfig::default());
    let leds: &'static SharedLeds =
        LEDS.init(SharedLeds::new(StatusLeds::new(run_led, con_led, user_led)));

    // BOOT button, active low
    let button = Input::new(peripherals.GPIO0, InputConfig::default().with_pull(Pull::Up));

    let advertising: &'static Advertising = ADVERTISING.init(
        AdvertisingController::new(
            ble::DEVICE_NAME,
            &LBS_SERVICE_UUID,
            AdvertisingParams::default(),
        )
        .expect("Advertising payload does not fit"),
    );

    let mut platform = EspPlatform::new(leds, button, &APP_BUTTON, peripherals.BT);
    let callbacks = AppCallbacks {
        led: leds,
        button: &APP_BUTTON,
    };
    let service = match app::boot(&mut platform, callbacks, advertising) {
        Ok(service) => service,
        Err(e) => panic!("Boot failed: {}", e),
    };

    let (button, controller) = platform.into_parts();
    let controller = controller.expect("BLE controller missing after boot");

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, controller, service, advertising, leds, button));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    controller: BleController,
    service: AppService,
    advertising: &'static Advertising,
    leds: &'static SharedLeds,
    button: Input<'static>,
) {
    spawner.must_spawn(ble_host_task(controller, service, advertising, leds));
    spawner.must_spawn(button_task(button));
    spawner.must_spawn(blink_task(leds));
}

/// Task that manages BLE connectivity
#[embassy_executor::task]
async fn ble_host_task(
    controller: BleController,
    service: AppService,
    advertising: &'static Advertising,
    leds: &'static SharedLeds,
) {
    tasks::ble_task(controller, service, advertising, leds, &APP_BUTTON).await;
}

/// Task that tracks the user button
#[embassy_executor::task]
async fn button_task(button: Input<'static>) {
    tasks::button_task(button, &APP_BUTTON).await;
}

/// Task that blinks the run-status LED
#[embassy_executor::task]
async fn blink_task(leds: &'static SharedLeds) {
    tasks::blink_task(leds).await;
}
