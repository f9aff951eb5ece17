//! Equal-tempered note table, C0 to B8 with A4 = 440 Hz.

use std::sync::LazyLock;

/// Reference pitch of A4.
pub const A4_HZ: f32 = 440.0;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone index of A4 counted from C0.
const A4_INDEX: i32 = 4 * 12 + 9;

/// One entry of the note table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Pitch class name, e.g. `"C#"`.
    pub pitch_class: &'static str,
    /// Octave number.
    pub octave: u8,
    /// Frequency in Hz.
    pub frequency: f32,
}

impl Note {
    /// Name with octave, e.g. `"C#3"`.
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_class, self.octave)
    }
}

/// Every note from C0 to B8, ascending by frequency.
pub static NOTES: LazyLock<Vec<Note>> = LazyLock::new(|| {
    (0..9u8)
        .flat_map(|octave| {
            NAMES.iter().enumerate().map(move |(class, &pitch_class)| {
                let index = i32::from(octave) * 12 + class as i32;
                Note {
                    pitch_class,
                    octave,
                    frequency: A4_HZ * 2f32.powf((index - A4_INDEX) as f32 / 12.0),
                }
            })
        })
        .collect()
});

/// Table entry nearest to `frequency`.
///
/// Binary-searches the table and compares the two neighbours straddling
/// `frequency`. Returns `None` for non-finite or non-positive input.
///
/// ```rust
/// use stomp_analysis::find_closest_note;
///
/// let note = find_closest_note(445.0).unwrap();
/// assert_eq!(note.name(), "A4");
/// ```
pub fn find_closest_note(frequency: f32) -> Option<&'static Note> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    let notes = NOTES.as_slice();
    let upper = notes.partition_point(|note| note.frequency < frequency);
    match (upper.checked_sub(1).map(|i| &notes[i]), notes.get(upper)) {
        (Some(below), Some(above)) => {
            if frequency - below.frequency <= above.frequency - frequency {
                Some(below)
            } else {
                Some(above)
            }
        }
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}
