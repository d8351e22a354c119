mod message;
mod udp;

pub use udp::UdpAddressProvider;
