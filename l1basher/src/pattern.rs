//! Access patterns

// Imports
use crate::workspace::LINE_SIZE;

/// Maximum number of steps shown by [`AccessPattern::cadence`]
pub const CADENCE_MAX_STEPS: usize = 8;

/// Access pattern
///
/// Dictates which byte offset of a workspace is read at each step.
/// Every offset is the first byte of some cache line.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum AccessPattern {
	/// Strided with skip.
	///
	/// Step `i` reads offset `(i * stride) % total_size`, with a stride
	/// of `1 + skip_lines` cache lines.
	Strided {
		/// Extra lines skipped per step
		skip_lines: usize,
	},

	/// Modulo indexing.
	///
	/// Step `i` reads the first byte of line `i % lines`.
	Modulo,
}

impl AccessPattern {
	/// Returns the skipped lines per step.
	///
	/// Always `0` for [`AccessPattern::Modulo`]
	pub fn skip_lines(self) -> usize {
		match self {
			Self::Strided { skip_lines } => skip_lines,
			Self::Modulo => 0,
		}
	}

	/// Returns the distance, in bytes, between two consecutive steps
	pub fn stride(self) -> usize {
		(1 + self.skip_lines()) * LINE_SIZE
	}

	/// Returns the offset read at step `step` in a workspace of `lines` lines.
	///
	/// # Panics
	/// Panics if `lines` is 0.
	pub fn offset(self, lines: usize, step: usize) -> usize {
		assert!(lines > 0, "Workspace must have at least 1 line");
		match self {
			Self::Strided { .. } => {
				// Note: Widened so large step counts can't overflow the product
				let total_size = (lines * LINE_SIZE) as u128;
				let offset = (step as u128 * self.stride() as u128) % total_size;
				offset as usize
			},
			Self::Modulo => (step % lines) * LINE_SIZE,
		}
	}

	/// Returns all offsets of this pattern, starting at step 0.
	///
	/// The iterator never ends, it wraps around the workspace.
	///
	/// # Panics
	/// Panics if `lines` is 0.
	pub fn offsets(self, lines: usize) -> Offsets {
		assert!(lines > 0, "Workspace must have at least 1 line");
		let total_size = lines * LINE_SIZE;

		// Note: Modulo indexing is a walk with a stride of a single line
		Offsets {
			next: 0,
			stride: self.stride() % total_size,
			total_size,
		}
	}

	/// Returns the number of steps until the pattern repeats.
	///
	/// Each step within a period touches a distinct line, so this is
	/// also the number of lines touched.
	///
	/// # Panics
	/// Panics if `lines` is 0.
	pub fn period(self, lines: usize) -> usize {
		assert!(lines > 0, "Workspace must have at least 1 line");
		match self {
			Self::Strided { .. } => {
				let total_size = lines * LINE_SIZE;
				total_size / self::gcd(self.stride(), total_size)
			},
			Self::Modulo => lines,
		}
	}

	/// Returns if every line is touched within one period
	pub fn covers_all_lines(self, lines: usize) -> bool {
		self.period(lines) == lines
	}

	/// Returns the first few offsets of this pattern.
	///
	/// Stops after the second time offset `0` is read, or after
	/// [`CADENCE_MAX_STEPS`] steps.
	pub fn cadence(self, lines: usize) -> Vec<usize> {
		let mut zeros = 0;
		(0..CADENCE_MAX_STEPS)
			.map(|step| self.offset(lines, step))
			.take_while(|&offset| {
				let keep = zeros < 2;
				if offset == 0 {
					zeros += 1;
				}
				keep
			})
			.collect()
	}
}

impl Default for AccessPattern {
	fn default() -> Self {
		Self::Strided { skip_lines: 0 }
	}
}

/// Offsets iterator.
///
/// See [`AccessPattern::offsets`].
#[derive(Clone, Debug)]
pub struct Offsets {
	/// Next offset
	next: usize,

	/// Stride, less than `total_size`
	stride: usize,

	/// Total size
	total_size: usize,
}

impl Iterator for Offsets {
	type Item = usize;

	#[inline]
	fn next(&mut self) -> Option<Self::Item> {
		let offset = self.next;

		// Note: Both operands are below `total_size`, so this can't overflow
		//       for any allocatable workspace.
		self.next += self.stride;
		if self.next >= self.total_size {
			self.next -= self.total_size;
		}

		Some(offset)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(usize::MAX, None)
	}
}

/// Greatest common divisor
fn gcd(mut lhs: usize, mut rhs: usize) -> usize {
	while rhs != 0 {
		(lhs, rhs) = (rhs, lhs % rhs);
	}
	lhs
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strided_wraps_around() {
		let pattern = AccessPattern::Strided { skip_lines: 1 };
		assert_eq!(pattern.stride(), 128);

		let offsets = pattern.offsets(8).take(5).collect::<Vec<_>>();
		assert_eq!(offsets, [0, 128, 256, 384, 0]);
	}

	#[test]
	fn modulo_cycles_lines() {
		let lines = AccessPattern::Modulo
			.offsets(4)
			.take(8)
			.map(|offset| offset / LINE_SIZE)
			.collect::<Vec<_>>();
		assert_eq!(lines, [0, 1, 2, 3, 0, 1, 2, 3]);
	}

	#[test]
	fn modulo_ignores_skip() {
		assert_eq!(AccessPattern::Modulo.skip_lines(), 0);
		assert_eq!(AccessPattern::Modulo.stride(), LINE_SIZE);
	}

	#[test]
	fn iterator_matches_closed_form() {
		let patterns = [
			AccessPattern::Strided { skip_lines: 0 },
			AccessPattern::Strided { skip_lines: 3 },
			AccessPattern::Strided { skip_lines: 7 },
			AccessPattern::Modulo,
		];
		for pattern in patterns {
			for lines in [1, 5, 8, 12, 512] {
				for (step, offset) in pattern.offsets(lines).take(3 * lines + 7).enumerate() {
					assert_eq!(offset, pattern.offset(lines, step), "{pattern:?}, lines={lines}, step={step}");
				}
			}
		}
	}

	#[test]
	fn offsets_stay_in_bounds() {
		for skip_lines in [0, 1, 3, 5, 9, 31] {
			let pattern = AccessPattern::Strided { skip_lines };
			for lines in (skip_lines + 1)..(skip_lines + 40) {
				let total_size = lines * LINE_SIZE;
				assert!(pattern.offsets(lines).take(4 * lines).all(|offset| offset < total_size));
				assert!(pattern.offsets(lines).take(4 * lines).all(|offset| offset % LINE_SIZE == 0));
			}
		}

		assert!(AccessPattern::Modulo.offsets(3).take(100).all(|offset| offset < 3 * LINE_SIZE));
	}

	#[test]
	fn strided_period() {
		let pattern = AccessPattern::Strided { skip_lines: 1 };
		assert_eq!(pattern.period(8), 4);

		for skip_lines in [0, 1, 3, 5] {
			let pattern = AccessPattern::Strided { skip_lines };
			for lines in (skip_lines + 1)..64 {
				let period = pattern.period(lines);
				let offsets = pattern.offsets(lines).take(2 * period).collect::<Vec<_>>();
				assert_eq!(offsets[..period], offsets[period..]);

				// And nothing repeats before the period
				let mut seen = offsets[..period].to_vec();
				seen.sort_unstable();
				seen.dedup();
				assert_eq!(seen.len(), period);
			}
		}
	}

	#[test]
	fn modulo_period_is_lines() {
		for lines in 1..32 {
			assert_eq!(AccessPattern::Modulo.period(lines), lines);
			assert!(AccessPattern::Modulo.covers_all_lines(lines));
		}
	}

	// An odd skip smaller than the line count is accepted by the configuration,
	// but it doesn't always visit every line before repeating.
	#[test]
	fn odd_skip_does_not_guarantee_full_coverage() {
		let pattern = AccessPattern::Strided { skip_lines: 1 };
		assert!(!pattern.covers_all_lines(8));
		assert!(pattern.covers_all_lines(7));

		let pattern = AccessPattern::Strided { skip_lines: 5 };
		assert!(!pattern.covers_all_lines(9));
		assert_eq!(pattern.period(9), 3);
	}

	#[test]
	fn cadence_stops_after_second_zero() {
		let pattern = AccessPattern::Strided { skip_lines: 1 };
		assert_eq!(pattern.cadence(8), [0, 128, 256, 384, 0]);
		assert_eq!(AccessPattern::Modulo.cadence(1), [0, 0]);
	}

	#[test]
	fn cadence_is_capped() {
		let cadence = AccessPattern::default().cadence(512);
		assert_eq!(cadence.len(), CADENCE_MAX_STEPS);
		assert_eq!(cadence, (0..8).map(|line| line * LINE_SIZE).collect::<Vec<_>>());
	}

	#[test]
	fn gcd_works() {
		assert_eq!(gcd(128, 512), 128);
		assert_eq!(gcd(384, 576), 192);
		assert_eq!(gcd(7, 0), 7);
	}
}
