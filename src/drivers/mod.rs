pub mod soc_gpio;
