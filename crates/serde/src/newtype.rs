use courier_common::prelude::*;

/// A single field wrapper which can be taken apart and rebuilt, so that the
/// felt adapters work for every felt newtype.
pub trait NewType<T> {
    fn into_inner(self) -> T;
    fn from_inner(inner: T) -> Self;
}

impl NewType<Felt> for Felt {
    fn into_inner(self) -> Felt {
        self
    }

    fn from_inner(inner: Felt) -> Self {
        inner
    }
}

macro_rules! newtype {
    ($($target:ty),+ $(,)?) => {
        $(
            impl NewType<Felt> for $target {
                fn into_inner(self) -> Felt {
                    self.0
                }

                fn from_inner(inner: Felt) -> Self {
                    Self(inner)
                }
            }
        )+
    };
}

newtype!(
    BlockHash,
    CallParam,
    CallResultValue,
    CasmHash,
    ChainId,
    ClassHash,
    ConstructorParam,
    ContractAddressSalt,
    EntryPoint,
    EventData,
    EventKey,
    Fee,
    StateRoot,
    StorageValue,
    TransactionHash,
    TransactionNonce,
    TransactionSignatureElem,
    TransactionVersion,
);
