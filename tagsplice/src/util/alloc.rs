use crate::error::Result;
use crate::macros::err;

use crate::config::global_options;

/// Provides the `fallible_repeat` method on `Vec`
///
/// It is intended to be used in [`try_vec!`](crate::macros::try_vec).
trait VecFallibleRepeat<T>: Sized {
	fn fallible_repeat(self, element: T, expected_size: usize) -> Result<Self>
	where
		T: Clone;
}

impl<T> VecFallibleRepeat<T> for Vec<T> {
	fn fallible_repeat(mut self, element: T, expected_size: usize) -> Result<Self>
	where
		T: Clone,
	{
		if expected_size == 0 {
			return Ok(self);
		}

		if expected_size > unsafe { global_options().allocation_limit } {
			err!(TooMuchData);
		}

		self.try_reserve(expected_size)?;
		self.resize(expected_size, element);

		Ok(self)
	}
}

/// **DO NOT USE DIRECTLY**
///
/// Creates a `Vec` of the specified length, containing copies of `element`.
///
/// This should be used through [`try_vec!`](crate::macros::try_vec)
pub(crate) fn fallible_vec_from_element<T>(element: T, expected_size: usize) -> Result<Vec<T>>
where
	T: Clone,
{
	Vec::new().fallible_repeat(element, expected_size)
}

#[cfg(test)]
mod tests {
	use crate::config::{GlobalOptions, apply_global_options};
	use crate::error::ErrorKind;
	use crate::util::alloc::fallible_vec_from_element;

	#[test_log::test]
	fn vec_fallible_repeat() {
		let u8_vec_len_20 = fallible_vec_from_element(0u8, 20).unwrap();
		assert_eq!(u8_vec_len_20.len(), 20);
		assert!(u8_vec_len_20.iter().all(|b| *b == 0));
	}

	#[test_log::test]
	fn allocation_limit_is_enforced() {
		apply_global_options(GlobalOptions::new().allocation_limit(16));

		let err = fallible_vec_from_element(0u8, 17).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::TooMuchData));

		apply_global_options(GlobalOptions::default());
	}
}
