#[cfg(feature = "rtrb")]
use rtrb::Consumer;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlMessage {
    SetRate(f32),
    SetDepth(f32),
    SetOffsetDegrees(f32),
    SetWidth(f32),
    SetColor(f32),
    SetMix(f32),
    SetCentreDelayMs(f32),
    SetFamily(usize),
    SetHighQuality(bool),
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}
