use bitflags::bitflags;

bitflags! {
    /// Presentation flags of a dialogue prompt.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ScriptMessageParam: u8 {
        /// Hide the close button.
        const NOT_CANCELLABLE = 0x01;
        const PLAYER_AS_SPEAKER = 0x02;
        const SPEAKER_ON_RIGHT = 0x04;
        const FLIP_SPEAKER = 0x08;
    }
}
