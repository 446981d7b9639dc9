#[allow(unused_macros)]
macro_rules! feed {
    ($handler: expr, $keys: expr) => {
        $handler.feed(&$keys.parse::<keyseq::KeySequence>().unwrap())
    };
}

#[allow(unused_macros)]
macro_rules! assert_action {
    ($rx: expr, $name: expr, $count: expr) => {{
        let act = $rx.try_recv().expect("expected an action");
        assert_eq!(act.name, $name);
        assert_eq!(act.count, $count);
        act
    }};
}

#[allow(unused_macros)]
macro_rules! assert_no_action {
    ($rx: expr) => {
        assert_eq!($rx.try_recv().ok(), None);
    };
}

#[allow(unused_macros)]
macro_rules! strs {
    ( $( $ss: expr ),* ) => {
        vec![ $( String::from($ss), )* ]
    };
}
