use embassy_stm32::gpio::OutputType;
use embassy_stm32::peripherals::{TIM3, TIM4};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{BufferedUart, BufferedUartRx, BufferedUartTx, Config as UsartConfig};
use embassy_stm32::{bind_interrupts, peripherals, rcc, usart, Config};
use static_cell::StaticCell;

use servo_rig::config::{LINK_BAUDRATE, LINK_RX_BUFFER_SIZE, LINK_TX_BUFFER_SIZE, PWM_FREQUENCY_HZ};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
});

static LINK_RX_BUF: StaticCell<[u8; LINK_RX_BUFFER_SIZE]> = StaticCell::new();
static LINK_TX_BUF: StaticCell<[u8; LINK_TX_BUFFER_SIZE]> = StaticCell::new();

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub link_tx: BufferedUartTx<'static>,
    pub link_rx: BufferedUartRx<'static>,
    /// S1..S4 on PA6, PA7, PB0, PB1
    pub servo_pwm_a: SimplePwm<'static, TIM3>,
    /// S5, S6 on PB6, PB7
    pub servo_pwm_b: SimplePwm<'static, TIM4>,
}

impl Board {
    pub fn init() -> Self {
        // 8MHz HSE -> PLL x9 -> 72MHz SYSCLK, APB1 36MHz (timers x2 = 72MHz)
        let mut config = Config::default();
        config.rcc.hse = Some(rcc::Hse {
            freq: Hertz(8_000_000),
            mode: rcc::HseMode::Oscillator,
        });
        config.rcc.pll = Some(rcc::Pll {
            src: rcc::PllSource::HSE,
            prediv: rcc::PllPreDiv::DIV1,
            mul: rcc::PllMul::MUL9,
        });
        config.rcc.sys = rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = rcc::AHBPrescaler::DIV1;
        config.rcc.apb1_pre = rcc::APBPrescaler::DIV2;
        config.rcc.apb2_pre = rcc::APBPrescaler::DIV1;
        let p = embassy_stm32::init(config);

        // USART3 sensor link: PB10 TX, PB11 RX, byte-interrupt driven
        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = LINK_BAUDRATE;

        let uart = BufferedUart::new(
            p.USART3,
            Irqs,
            p.PB11,
            p.PB10,
            LINK_TX_BUF.init([0; LINK_TX_BUFFER_SIZE]),
            LINK_RX_BUF.init([0; LINK_RX_BUFFER_SIZE]),
            us_cfg,
        )
        .unwrap();
        let (link_tx, link_rx) = uart.split();

        // Servo PWM, 50Hz frame on TIM3 and TIM4
        let servo_pwm_a = SimplePwm::new(
            p.TIM3,
            Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
            Some(PwmPin::new_ch2(p.PA7, OutputType::PushPull)),
            Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
            Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
            Hertz(PWM_FREQUENCY_HZ),
            CountingMode::EdgeAlignedUp,
        );
        let servo_pwm_b = SimplePwm::new(
            p.TIM4,
            Some(PwmPin::new_ch1(p.PB6, OutputType::PushPull)),
            Some(PwmPin::new_ch2(p.PB7, OutputType::PushPull)),
            None,
            None,
            Hertz(PWM_FREQUENCY_HZ),
            CountingMode::EdgeAlignedUp,
        );

        Self {
            link_tx,
            link_rx,
            servo_pwm_a,
            servo_pwm_b,
        }
    }
}
