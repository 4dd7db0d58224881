//! Conversion of tuples, arrays and vectors into clause argument lists.

use crate::ast::{Aggregate, Assignment, Cte, Expr, OrderBy, SelectColumn};
use crate::schema::{ColumnRef, Table};

/// Anything that can be turned into a list of `T`.
///
/// Implemented for tuples of up to 12 heterogeneous items convertible into
/// `T`, for arrays and vectors of such items, and for single items.
pub trait IntoList<T> {
    fn into_list(self) -> Vec<T>;
}

impl<T, A: Into<T>> IntoList<T> for Vec<A> {
    fn into_list(self) -> Vec<T> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T, A: Into<T>, const N: usize> IntoList<T> for [A; N] {
    fn into_list(self) -> Vec<T> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! impl_into_list_tuple {
    ($($idx:tt: $item:ident),+) => {
        impl<T, $($item: Into<T>),+> IntoList<T> for ($($item,)+) {
            fn into_list(self) -> Vec<T> {
                vec![$(self.$idx.into()),+]
            }
        }
    };
}

impl_into_list_tuple!(0: C0);
impl_into_list_tuple!(0: C0, 1: C1);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6, 7: C7);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6, 7: C7, 8: C8);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6, 7: C7, 8: C8, 9: C9);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6, 7: C7, 8: C8, 9: C9, 10: C10);
impl_into_list_tuple!(0: C0, 1: C1, 2: C2, 3: C3, 4: C4, 5: C5, 6: C6, 7: C7, 8: C8, 9: C9, 10: C10, 11: C11);

macro_rules! impl_into_list_single {
    ($($target:ident <= $($item:ident),+);+ $(;)?) => {
        $($(
            impl IntoList<$target> for $item {
                fn into_list(self) -> Vec<$target> {
                    vec![self.into()]
                }
            }
        )+)+
    };
}

impl_into_list_single!(
    SelectColumn <= SelectColumn, ColumnRef, Expr, Aggregate;
    Expr <= Expr, ColumnRef, Aggregate;
    OrderBy <= OrderBy, ColumnRef, Expr;
    Assignment <= Assignment;
    ColumnRef <= ColumnRef;
    Table <= Table;
    Cte <= Cte;
);
