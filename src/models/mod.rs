// Enums are persisted as their display label (MySQL ENUM / VARCHAR columns).
// Encoding and decoding go through the strum `Display`/`FromStr` impls so the
// label lives in exactly one place.
macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sqlx::Type<sqlx::MySql> for $ty {
                fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                    <str as sqlx::Type<sqlx::MySql>>::type_info()
                }

                fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                    <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
                }
            }

            impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
                fn encode_by_ref(
                    &self,
                    buf: &mut <sqlx::MySql as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
                ) -> sqlx::encode::IsNull {
                    <String as sqlx::Encode<'q, sqlx::MySql>>::encode(self.to_string(), buf)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
                fn decode(
                    value: <sqlx::MySql as sqlx::database::HasValueRef<'r>>::ValueRef,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let label = <&str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)?;
                    Ok(label.parse::<$ty>()?)
                }
            }
        )*
    };
}

pub mod booking;
pub mod cancellation;
pub mod journey;
pub mod passenger;
pub mod payment;
