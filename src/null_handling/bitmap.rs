//! Builders that turn `(values, validity)` pairs into Arrow arrays.

use std::sync::Arc;

use arrow::array::{ArrayRef, PrimitiveArray};
use arrow::buffer::{NullBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, DurationMicrosecondType, DurationMillisecondType,
    DurationNanosecondType, DurationSecondType, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};

use crate::error::SavCaseError;

/// Builds a validity buffer, or `None` when every slot is valid.
pub fn validity_to_null_buffer(validity: Vec<bool>) -> Option<NullBuffer> {
    if validity.iter().all(|v| *v) {
        None
    } else {
        Some(NullBuffer::from(validity))
    }
}

/// Reapplies a validity mask to a dense vector of values.
///
/// `values` holds one slot per row, including placeholder slots for nulls.
pub fn reapply_bitmap_from_vec<T: ArrowPrimitiveType>(
    values: Vec<T::Native>,
    validity: Vec<bool>,
) -> Result<PrimitiveArray<T>, SavCaseError> {
    if values.len() != validity.len() {
        return Err(SavCaseError::InternalError(format!(
            "value count {} does not match validity count {}",
            values.len(),
            validity.len()
        )));
    }
    let nulls = validity_to_null_buffer(validity);
    Ok(PrimitiveArray::<T>::try_new(ScalarBuffer::from(values), nulls)?)
}

/// Builds a timestamp or duration array of `data_type` from `i64` ticks.
pub fn reapply_bitmap_temporal(
    ticks: Vec<i64>,
    validity: Vec<bool>,
    data_type: &DataType,
) -> Result<ArrayRef, SavCaseError> {
    let base = reapply_bitmap_from_vec::<Int64Type>(ticks, validity)?;
    let array: ArrayRef = match data_type {
        DataType::Timestamp(TimeUnit::Second, _) => {
            Arc::new(base.reinterpret_cast::<TimestampSecondType>())
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            Arc::new(base.reinterpret_cast::<TimestampMillisecondType>())
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            Arc::new(base.reinterpret_cast::<TimestampMicrosecondType>())
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            Arc::new(base.reinterpret_cast::<TimestampNanosecondType>())
        }
        DataType::Duration(TimeUnit::Second) => Arc::new(base.reinterpret_cast::<DurationSecondType>()),
        DataType::Duration(TimeUnit::Millisecond) => {
            Arc::new(base.reinterpret_cast::<DurationMillisecondType>())
        }
        DataType::Duration(TimeUnit::Microsecond) => {
            Arc::new(base.reinterpret_cast::<DurationMicrosecondType>())
        }
        DataType::Duration(TimeUnit::Nanosecond) => {
            Arc::new(base.reinterpret_cast::<DurationNanosecondType>())
        }
        other => {
            return Err(SavCaseError::InternalError(format!(
                "{} is not a temporal type",
                other
            )))
        }
    };
    Ok(array)
}
