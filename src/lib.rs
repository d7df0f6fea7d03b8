// High-level overview:
//
// Protocol:                UDP datagrams           unix socket
// Library Concept:  base <--------------> drone <-------------> pixel driver
//
// Implementing Binary:  dronelight-base  dronelight-daemon    pixeld-dummy
//                       (operator shell) (codec, arbiter,     (or the real
//                                         renderer, status)    strip driver)

pub mod arbiter;
pub mod args;
pub mod codec;
pub mod pattern;
pub mod renderer;
pub mod sink;
