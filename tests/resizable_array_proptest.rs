// Property: ResizableArray behaves like Vec for contents, and its capacity
// follows the doubling/halving policy after every operation.
use chained_hashmap::{Error, ResizableArray};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Insert(usize, i32),
    Remove(usize),
    Pop,
    Set(usize, i32),
    Get(usize),
    Append(Vec<i32>),
    ShrinkToFit,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // Indices run a little past typical lengths so the error paths are hit.
    let idx = 0usize..24;
    let op = prop_oneof![
        4 => any::<i32>().prop_map(Op::Push),
        2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        3 => idx.clone().prop_map(Op::Remove),
        2 => Just(Op::Pop),
        1 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
        1 => idx.prop_map(Op::Get),
        1 => proptest::collection::vec(any::<i32>(), 0..6).prop_map(Op::Append),
        1 => Just(Op::ShrinkToFit),
    ];
    proptest::collection::vec(op, 1..120)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_vec_model(ops in arb_ops()) {
        let freed = Rc::new(RefCell::new(Vec::new()));
        let mut sut: ResizableArray<i32> = ResizableArray::new();
        let sink = freed.clone();
        sut.set_free(move |v| sink.borrow_mut().push(v));
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            let cap_before = sut.capacity();
            let len_before = model.len();
            match op {
                Op::Push(v) => {
                    sut.push_back(v);
                    model.push(v);
                    if len_before == cap_before {
                        prop_assert_eq!(sut.capacity(), cap_before * 2);
                    } else {
                        prop_assert_eq!(sut.capacity(), cap_before);
                    }
                }
                Op::Insert(i, v) => {
                    let r = sut.insert(i, v);
                    if i <= model.len() {
                        prop_assert_eq!(r, Ok(()));
                        model.insert(i, v);
                    } else {
                        prop_assert_eq!(r, Err(Error::IndexOutOfBounds { index: i, len: len_before }));
                    }
                }
                Op::Remove(i) => {
                    let r = sut.remove(i);
                    if i < model.len() {
                        prop_assert_eq!(r, Ok(model.remove(i)));
                    } else {
                        prop_assert!(r.is_err());
                        prop_assert_eq!(sut.capacity(), cap_before);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(sut.pop_back(), model.pop());
                }
                Op::Set(i, v) => {
                    let r = sut.set(i, v);
                    if i < model.len() {
                        prop_assert_eq!(r, Ok(Some(std::mem::replace(&mut model[i], v))));
                    } else if i == model.len() {
                        prop_assert_eq!(r, Ok(None));
                        model.push(v);
                    } else {
                        prop_assert!(r.is_err());
                    }
                }
                Op::Get(i) => {
                    prop_assert_eq!(sut.get(i).ok(), model.get(i));
                }
                Op::Append(vs) => {
                    let donor: ResizableArray<i32> = vs.iter().copied().collect();
                    sut.append(donor);
                    model.extend(vs);
                }
                Op::ShrinkToFit => {
                    sut.shrink_to_fit();
                    prop_assert_eq!(sut.capacity(), model.len().max(1));
                }
            }

            // Post-conditions after each op
            prop_assert_eq!(sut.iter().copied().collect::<Vec<_>>(), model.clone());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity() >= 1);
            prop_assert!(sut.capacity() >= sut.len());
            if sut.is_empty() && len_before > 0 {
                prop_assert_eq!(sut.capacity(), 1);
            }
        }

        // Elements taken out by the caller are never disposed of; the ones
        // still held are, on drop.
        prop_assert!(freed.borrow().is_empty());
        drop(sut);
        prop_assert_eq!(freed.borrow().clone(), model);
    }
}
